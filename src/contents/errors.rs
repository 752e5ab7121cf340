//! Error types for the contents layer

use crate::store::StoreError;
use thiserror::Error;

/// Result type for contents operations
pub type ContentsResult<T> = Result<T, ContentsError>;

/// Error taxonomy exposed to the host
#[derive(Error, Debug)]
pub enum ContentsError {
    /// No entry of `kind` lives at `path`
    #[error("{kind} does not exist: {path}")]
    NotFound {
        /// "Notebook", "Directory" or "Entry"
        kind: &'static str,
        /// Requested path
        path: String,
    },

    /// No checkpoint with this id exists for `path`
    #[error("Notebook checkpoint does not exist: {path}-{checkpoint_id}")]
    CheckpointNotFound {
        /// Entry path
        path: String,
        /// Requested checkpoint id
        checkpoint_id: String,
    },

    /// Rename or save target is already occupied
    #[error("Entry with name already exists: {path}")]
    Conflict {
        /// Occupied path
        path: String,
    },

    /// Malformed caller input
    #[error("Bad request: {message}")]
    BadRequest {
        /// What was wrong with the request
        message: String,
    },

    /// Unexpected failure while serving `path`
    #[error("Error at path {path}: {source}")]
    Internal {
        /// Path being served
        path: String,
        /// Underlying failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Stored row cannot be decoded
    #[error("Corrupted entry at {path}: {message}")]
    CorruptedEntry {
        /// Path of the row
        path: String,
        /// What is missing or malformed
        message: String,
    },

    /// Document store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Notebook JSON failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ContentsError {
    /// Create a not found error for an entry of the given kind
    pub fn not_found<S: Into<String>>(kind: &'static str, path: S) -> Self {
        Self::NotFound {
            kind,
            path: path.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(path: S) -> Self {
        Self::Conflict { path: path.into() }
    }

    /// Create a bad request error
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a corrupted entry error
    pub fn corrupted<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::CorruptedEntry {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap any failure as an internal error at `path`
    pub fn internal<P, E>(path: P, source: E) -> Self
    where
        P: Into<String>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Internal {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether this error belongs to the host-visible taxonomy
    /// (not found, conflict, bad request, internal)
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            ContentsError::NotFound { .. }
                | ContentsError::CheckpointNotFound { .. }
                | ContentsError::Conflict { .. }
                | ContentsError::BadRequest { .. }
                | ContentsError::Internal { .. }
        )
    }

    /// Whether the failure reports an absent entry or checkpoint
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContentsError::NotFound { .. } | ContentsError::CheckpointNotFound { .. }
        )
    }

    /// HTTP-style status code the host should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ContentsError::NotFound { .. } | ContentsError::CheckpointNotFound { .. } => 404,
            ContentsError::Conflict { .. } => 409,
            ContentsError::BadRequest { .. } => 400,
            _ => 500,
        }
    }

    /// Keep domain errors as they are; wrap everything else as internal
    pub(crate) fn at_path(self, path: &str) -> Self {
        if self.is_domain() {
            self
        } else {
            Self::internal(path, self)
        }
    }
}
