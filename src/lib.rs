// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod auth;
pub mod categories;
pub mod cli;
pub mod commands;
pub mod config;
pub mod currencies;
pub mod db;
pub mod error;
pub mod fx;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod summary;
pub mod transactions;
pub mod utils;
