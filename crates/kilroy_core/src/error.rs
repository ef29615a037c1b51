use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// An immutable resource already holds different content.
    #[error("Resource already exists with different content: {0}")]
    Conflict(String),

    #[error("Invalid resource identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Path traversal rejected: {0}")]
    Traversal(String),
}

impl StorageError {
    /// True for the "does not exist" signal, whichever layer raised it.
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::NotFound(_) => true,
            StorageError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Failures of the authentication machinery itself.
///
/// Bad or missing credentials are not an `AuthError`; strategies report
/// those as a verification without an identity.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Session store error: {0}")]
    Session(String),
}
