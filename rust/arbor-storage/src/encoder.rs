use serde::{Serialize, de::DeserializeOwned};

use crate::ArborStorageError;

mod cbor;
pub use cbor::*;

mod json;
pub use json::*;

/// An [Encoder] converts structured values to and from the raw bytes held by
/// a [crate::StorageBackend]
pub trait Encoder: Clone + Send + Sync {
    /// Encode a serializable value into bytes.
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, ArborStorageError>
    where
        T: Serialize + ?Sized;

    /// Decode bytes into some deserializable type.
    fn decode<T>(&self, bytes: &[u8]) -> Result<T, ArborStorageError>
    where
        T: DeserializeOwned;
}
