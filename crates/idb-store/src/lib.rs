//! IndexedDB Key-Value Store
//!
//! A thin adapter over one named, versioned local database holding several
//! named tables, each keyed by a declared primary-key field.
//!
//! Two backends share the [`KeyValueStore`] contract:
//! - [`IdbStore`] talks to the browser's IndexedDB through web-sys.
//! - [`MemoryStore`] keeps the same semantics in process memory.

mod config;
mod error;
mod idb;
mod key;
mod memory;
mod traits;

pub use config::{DbConfig, TableSchema, DEFAULT_PRIMARY_KEY};
pub use error::{StoreError, StoreResult};
pub use idb::IdbStore;
pub use key::{record_key, RecordKey};
pub use memory::{MemoryBackend, MemoryStore};
pub use traits::KeyValueStore;
