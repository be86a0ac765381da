// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy shared by every service module.
//!
//! Services return [`FinanceError`]; the command layer wraps it in
//! `anyhow` and `main` maps the [`ErrorKind`] to an exit code.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FinanceError>;

#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("Currency '{0}' not found")]
    CurrencyNotFound(String),
    #[error("Account {0} not found")]
    AccountNotFound(i64),
    #[error("Account {account_id} does not belong to user {user_id}")]
    AccountOwnershipMismatch { account_id: i64, user_id: i64 },
    #[error("User {0} has no default account")]
    NoDefaultAccount(i64),
    #[error("Category {0} not found")]
    CategoryNotFound(i64),
    #[error("Transaction type '{transaction}' does not match category type '{category}'")]
    CategoryTypeMismatch {
        category: String,
        transaction: String,
    },
    #[error("Transaction {0} not found")]
    TransactionNotFound(i64),
    #[error("User {0} not found")]
    UserNotFound(i64),
    #[error("Exchange rate {base}/{target} not available")]
    RateUnavailable { base: i64, target: i64 },
    #[error("Pivot currency '{0}' is not registered")]
    MissingBaseCurrency(String),
    #[error("Rate provider error: {0}")]
    ProviderError(String),
    #[error("User with email '{0}' already exists")]
    EmailTaken(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("{0}")]
    Internal(String),
}

/// Coarse classification used by transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    OwnershipViolation,
    ValidationFailure,
    UpstreamUnavailable,
    Unauthenticated,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::OwnershipViolation => 403,
            ErrorKind::ValidationFailure => 400,
            ErrorKind::UpstreamUnavailable => 502,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Internal => 500,
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::NotFound => 3,
            ErrorKind::OwnershipViolation => 4,
            ErrorKind::ValidationFailure => 2,
            ErrorKind::UpstreamUnavailable => 5,
            ErrorKind::Unauthenticated => 6,
            ErrorKind::Internal => 1,
        }
    }
}

impl FinanceError {
    /// Arithmetic on amounts or rates left the representable range.
    pub fn out_of_range() -> Self {
        FinanceError::Validation("amount out of range".into())
    }

    pub fn kind(&self) -> ErrorKind {
        use FinanceError::*;
        match self {
            CurrencyNotFound(_)
            | AccountNotFound(_)
            | NoDefaultAccount(_)
            | CategoryNotFound(_)
            | TransactionNotFound(_)
            | UserNotFound(_)
            | RateUnavailable { .. }
            | MissingBaseCurrency(_) => ErrorKind::NotFound,
            AccountOwnershipMismatch { .. } => ErrorKind::OwnershipViolation,
            CategoryTypeMismatch { .. } | EmailTaken(_) | Validation(_) => {
                ErrorKind::ValidationFailure
            }
            ProviderError(_) => ErrorKind::UpstreamUnavailable,
            InvalidCredentials | InvalidOrExpiredToken => ErrorKind::Unauthenticated,
            Database(_) | Internal(_) => ErrorKind::Internal,
        }
    }
}
