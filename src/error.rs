use thiserror::Error;

use crate::balance_sheet::BalanceSheetError;
use crate::event_bus::{ErrorData, EventError};
use crate::event::request_manager::RequestError;
use crate::fund_usage::FundUsageError;

/// The normalized `(numeric code, human-readable message)` pair every failure
/// is eventually reduced to. The HTTP layer maps `code` to a status code; the
/// event system carries it across module boundaries inside error envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct AppError {
    pub code: u16,
    pub message: String,
}

impl AppError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }
}

impl From<ErrorData> for AppError {
    fn from(err: ErrorData) -> Self {
        Self::new(err.code, err.message)
    }
}

impl From<AppError> for ErrorData {
    fn from(err: AppError) -> Self {
        ErrorData::new(err.code, err.message)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Event error: {0}")]
    Event(#[from] EventError),
    #[error("Request error: {0}")]
    Request(#[from] RequestError),
    #[error("Balance sheet error: {0}")]
    BalanceSheet(#[from] BalanceSheetError),
    #[error("Fund usage error: {0}")]
    FundUsage(#[from] FundUsageError),
    #[error("Application error: {0}")]
    App(#[from] AppError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
