#![warn(missing_docs)]

//! This crate contains a generalized API over ordered key-value stores that
//! are capable of committing several operations atomically.
//!
//! Select or implement a [StorageBackend] to hold raw bytes, and select or
//! implement an [Encoder] to turn your own types into those bytes:
//!
//! ```rust
//! # async fn example() -> Result<(), arbor_storage::ArborStorageError> {
//! use arbor_storage::{Batch, Encoder, JsonEncoder, MemoryStorageBackend, StorageBackend};
//!
//! let mut backend = MemoryStorageBackend::<String, Vec<u8>>::default();
//! let encoder = JsonEncoder;
//!
//! let batch = Batch::default()
//!     .put("one".to_string(), encoder.encode(&1u32)?)
//!     .put("two".to_string(), encoder.encode(&2u32)?);
//!
//! // Either both keys land or neither does
//! backend.write(batch).await?;
//!
//! let bytes = backend.get(&"two".to_string()).await?.unwrap_or_default();
//! assert_eq!(encoder.decode::<u32>(&bytes)?, 2);
//! # Ok(())
//! # }
//! ```

mod encoder;
pub use encoder::*;

mod error;
pub use error::*;

mod storage;
pub use storage::*;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;
