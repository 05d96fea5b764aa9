use thiserror::Error;

/// The common error type used by this crate
///
/// A missing key is never reported through this type; backends signal absence
/// by returning `None` from [`crate::StorageBackend::get`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArborStorageError {
    /// An error that occurs while encoding a value
    #[error("Failed to encode a value: {0}")]
    EncodeFailed(String),

    /// An error that occurs while decoding a value
    #[error("Failed to decode a value: {0}")]
    DecodeFailed(String),

    /// An error that occurs when working with a storage backend
    #[error("Storage backend error: {0}")]
    StorageBackend(String),
}

impl From<std::io::Error> for ArborStorageError {
    fn from(error: std::io::Error) -> Self {
        ArborStorageError::StorageBackend(format!("{error}"))
    }
}
