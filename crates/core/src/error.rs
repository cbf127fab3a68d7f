//! Error model shared by every layer above the core crate.

use thiserror::Error;

/// Domain-level error.
///
/// Deterministic failures of the model primitives themselves (malformed
/// identifiers). Storage failures live in the db crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Structured request-layer failure: an HTTP status code plus a
/// human-readable detail.
///
/// Model code raises this when an outcome should surface directly as an HTTP
/// response; the api crate turns it into one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{status}: {detail}")]
pub struct HttpError {
    pub status: u16,
    pub detail: String,
}

impl HttpError {
    pub const NOT_FOUND: u16 = 404;

    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(Self::NOT_FOUND, detail)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Self::NOT_FOUND
    }
}

impl From<DomainError> for HttpError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidId(_) => Self::new(422, err.to_string()),
        }
    }
}
