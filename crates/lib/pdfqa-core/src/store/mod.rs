//! Document store backed by an in-memory index and a raw-byte directory.
//!
//! The store layer persists uploaded bytes, extracts their text, and serves
//! record lookups by document id.

pub mod memory;

pub use memory::{DocStoreConfig, MemoryDocStore, ProcessingError, ProcessingResult};
