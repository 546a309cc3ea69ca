//! # LogKV Client
//!
//! Benchmark client adapter exposing a fixed CRUD contract over a
//! transactional, log-structured key-value store.
//!
//! The adapter translates a "table + key + field map" record model into
//! the byte-key/byte-value operations of [`logkv_store`]:
//!
//! - composite key encoding ([`composite_key`])
//! - field-map serialization with projection ([`encode_record`],
//!   [`decode_record`])
//! - a shared, reference-counted store connection
//!   ([`ConnectionManager`])
//! - the CRUD operation set with a tri-state status surface
//!   ([`Client`], [`Outcome`])
//!
//! ## Example
//!
//! ```rust
//! use logkv_client::{Client, Config, ConnectionManager, Outcome};
//! use logkv_store::Backend;
//! use std::sync::Arc;
//!
//! let manager = Arc::new(ConnectionManager::new());
//! let config = Config::new(Backend::Memory, "example");
//!
//! let mut client = Client::new(Arc::clone(&manager), config);
//! client.init().unwrap();
//!
//! let row = [("field-0".to_string(), b"value".to_vec())]
//!     .into_iter()
//!     .collect();
//! assert!(matches!(client.insert("table", "key", &row), Outcome::Ok(())));
//! assert!(matches!(client.read("table", "key", None), Outcome::Ok(_)));
//!
//! client.shutdown();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod connection;
mod error;
mod key;
mod record;
mod reporter;
mod stats;

pub use client::{Client, Outcome};
pub use config::Config;
pub use connection::{Connection, ConnectionManager};
pub use error::{ClientError, ClientResult};
pub use key::composite_key;
pub use record::{decode_record, encode_record, FieldMap};
pub use reporter::StatsReporter;
pub use stats::{ClientStats, StatsSnapshot};
