//! Core error types.

use thiserror::Error;

use crate::catalog::TypeCategory;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core catalog errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Null/empty identifier, malformed filter or malformed definition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Lookup by name or guid found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// A definition with the same name already exists.
    #[error("{category} type '{name}' already exists")]
    DuplicateName {
        /// Category of the existing definition.
        category: TypeCategory,
        /// Colliding name.
        name: String,
    },

    /// Unresolved or cyclic supertype reference.
    #[error("invalid supertype: {0}")]
    InvalidSuperType(String),

    /// Delete or update blocked by live dependents.
    #[error("'{name}' is in use by {}", .dependents.join(", "))]
    InUse {
        /// Name (or guid) of the item being deleted or updated.
        name: String,
        /// Descriptions of the blocking dependents.
        dependents: Vec<String>,
    },

    /// Value shape does not match its declared type.
    #[error("conversion error at {path}: {message}")]
    Conversion {
        /// Attribute path of the offending value.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// Concurrent update lost the race.
    #[error("conflict on '{name}': expected version {expected}, found {actual}")]
    Conflict {
        /// Name or guid of the contended item.
        name: String,
        /// Version the caller based its change on.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] typegraph_proto::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Coarse error classification used by request layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad identifier, filter or definition.
    InvalidArgument,
    /// Nothing found.
    NotFound,
    /// Name collision.
    DuplicateName,
    /// Supertype unresolved or cyclic.
    InvalidSuperType,
    /// Blocked by dependents.
    InUse,
    /// Value conversion failed.
    Conversion,
    /// Optimistic concurrency failure.
    Conflict,
    /// Persistence failure.
    Storage,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::DuplicateName { .. } => ErrorKind::DuplicateName,
            Error::InvalidSuperType(_) => ErrorKind::InvalidSuperType,
            Error::InUse { .. } => ErrorKind::InUse,
            Error::Conversion { .. } => ErrorKind::Conversion,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Storage(_)
            | Error::Protocol(_)
            | Error::Serialization(_)
            | Error::Deserialization(_) => ErrorKind::Storage,
        }
    }

    /// Check whether the caller caused this error (as opposed to the store).
    pub fn is_client_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Storage)
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Protocol(e.into())
    }
}
