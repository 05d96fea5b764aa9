use crate::ArborStorageError;

use super::Encoder;
use serde::{Serialize, de::DeserializeOwned};

/// An [`Encoder`] that encodes values as IPLD-compatible CBOR
#[derive(Clone, Copy, Debug, Default)]
pub struct CborEncoder;

impl Encoder for CborEncoder {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, ArborStorageError>
    where
        T: Serialize + ?Sized,
    {
        serde_ipld_dagcbor::to_vec(value)
            .map_err(|error| ArborStorageError::EncodeFailed(format!("{error}")))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, ArborStorageError>
    where
        T: DeserializeOwned,
    {
        serde_ipld_dagcbor::from_slice::<T>(bytes)
            .map_err(|error| ArborStorageError::DecodeFailed(format!("{error}")))
    }
}
