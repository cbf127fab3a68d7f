//! Persistence-layer errors.

use platform_core::HttpError;
use thiserror::Error;

/// Failure raised by a [`Session`](crate::session::Session) implementation.
///
/// The model layer never translates these; they reach the caller unchanged
/// inside [`ModelError::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Unique key collision (e.g. two inserts with the same id).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Not-null, foreign key or check constraint rejected a write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A row handed to the session does not fit its table.
    #[error("invalid row for table '{table}': {reason}")]
    InvalidRow { table: &'static str, reason: String },

    /// Driver / connection level failure.
    #[error("database error: {0}")]
    Database(String),

    /// Failure of the in-process backing store.
    #[error("storage error: {0}")]
    Storage(String),
}

impl SessionError {
    pub fn invalid_row(table: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            table,
            reason: reason.into(),
        }
    }
}

/// Error returned by the [`Model`](crate::model::Model) operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// `get_or_404` found no row; the only translated failure.
    #[error("{model}[{id}] not found")]
    NotFound { model: &'static str, id: String },

    /// Anything the session raised, untouched.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The model could not be turned into a row.
    #[error("failed to encode {model}: {reason}")]
    Encode { model: &'static str, reason: String },

    /// A stored row could not be turned back into the model.
    #[error("failed to decode {model}: {reason}")]
    Decode { model: &'static str, reason: String },
}

impl ModelError {
    pub fn not_found(model: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            model,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status this error surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => HttpError::NOT_FOUND,
            _ => 500,
        }
    }

    pub fn into_http(self) -> HttpError {
        HttpError::new(self.status_code(), self.to_string())
    }
}

impl From<ModelError> for HttpError {
    fn from(err: ModelError) -> Self {
        err.into_http()
    }
}
