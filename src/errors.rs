//! Unified error type for the course marketplace core.
//!
//! Every fallible operation returns [`Result`]. Domain failures carry enough
//! structure (see [`ErrorKind`]) for a web layer to map them onto status codes
//! without string matching.

use rust_decimal::Decimal;
use thiserror::Error;

/// Broad classification of an [`Error`], used by callers that only need the
/// failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced course, section, chapter or purchase target does not exist
    NotFound,
    /// Caller does not own the entity it tried to read or modify
    Forbidden,
    /// Input failed validation
    Validation,
    /// Concurrent write detected (order index already taken)
    Conflict,
    /// Caller aborted the operation
    Cancelled,
    /// Storage, configuration or I/O failure
    Internal,
}

/// Every failure the crate reports.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Not authorized to modify {entity} {id}")]
    Forbidden { entity: &'static str, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns the failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Validation { .. } | Self::InvalidAmount { .. } => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::IntConversion(_)
            | Self::Fmt(_) => ErrorKind::Internal,
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
