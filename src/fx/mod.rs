// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Exchange-rate resolution, refresh and currency conversion.
//!
//! Rates are stored directionally (1 base = rate target). A lookup tries the
//! direct row, then the inverse row, then composes two legs through the pivot
//! currency, so the store only needs pivot->X rows from the provider.

pub mod convert;
pub mod provider;
pub mod rates;
pub mod resolver;
pub mod scheduler;

pub use convert::Conversion;
pub use provider::{HttpRateProvider, RateProvider, RateQuote};
pub use resolver::{RateResolver, RateSource, RefreshReport, ResolvedRate};
pub use scheduler::RefreshScheduler;
