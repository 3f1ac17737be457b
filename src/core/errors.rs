use std::result::Result as StdResult;

use thiserror::Error;

use crate::domain::Cents;
use crate::errors::LedgerError;

/// Recoverable failures surfaced by every billing and ledger operation.
///
/// None of these are fatal; the enclosing transaction is rolled back before
/// the error reaches the caller.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(
        "Credit limit exceeded: {committed_cents} committed + {requested_cents} requested > {limit_cents}"
    )]
    LimitExceeded {
        limit_cents: Cents,
        committed_cents: Cents,
        requested_cents: Cents,
    },
    #[error("Insufficient funds: balance {balance_cents}, required {required_cents}")]
    InsufficientFunds {
        balance_cents: Cents,
        required_cents: Cents,
    },
    #[error(transparent)]
    Storage(#[from] LedgerError),
}

/// Payload-free discriminant of [`BillingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidState,
    InvalidInput,
    LimitExceeded,
    InsufficientFunds,
    Storage,
}

impl BillingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::NotFound(_) => ErrorKind::NotFound,
            BillingError::Forbidden(_) => ErrorKind::Forbidden,
            BillingError::InvalidState(_) => ErrorKind::InvalidState,
            BillingError::InvalidInput(_) => ErrorKind::InvalidInput,
            BillingError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            BillingError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            BillingError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn overflow(what: &str) -> Self {
        BillingError::InvalidInput(format!("{what} overflows the cent range"))
    }
}

pub type BillingResult<T> = StdResult<T, BillingError>;
