use crate::ArborStorageError;

use super::Encoder;
use serde::{Serialize, de::DeserializeOwned};

/// An [`Encoder`] that stores values as JSON text
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, ArborStorageError>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_vec(value).map_err(|error| ArborStorageError::EncodeFailed(format!("{error}")))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, ArborStorageError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice::<T>(bytes)
            .map_err(|error| ArborStorageError::DecodeFailed(format!("{error}")))
    }
}
