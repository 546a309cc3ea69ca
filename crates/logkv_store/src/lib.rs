//! # LogKV Store
//!
//! Abstract store interface and embedded backends for logkv.
//!
//! This crate defines the byte-key/byte-value surface the client adapter
//! talks to: opening a named log, opening a store atop it, point reads
//! and writes, forward iteration, and read-modify-write transactions.
//! Backends are **opaque byte stores** - they do not interpret keys or
//! values, and all record semantics live above this crate.
//!
//! ## Available backends
//!
//! - [`Backend::Memory`] - ephemeral, for tests and throwaway runs
//! - [`Backend::Local`] - file-backed log in a local directory
//! - [`Backend::Cluster`] - recognized but served by an external engine
//!
//! ## Example
//!
//! ```rust
//! use logkv_store::{open_log, Backend};
//!
//! let log = open_log(&Backend::Memory, "example").unwrap();
//! let store = log.open_store(true).unwrap();
//! store.put(b"k", b"v").unwrap();
//! assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod embedded;
mod error;
mod file;
mod memory;
mod store;

pub use embedded::EmbeddedStore;
pub use error::{StoreError, StoreResult};
pub use file::FileLog;
pub use memory::MemoryLog;
pub use store::{open_log, Backend, Log, Store, StoreIterator, StoreTransaction};
