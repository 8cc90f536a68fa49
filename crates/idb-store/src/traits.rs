//! Store Contract
//!
//! The async interface both backends implement. Futures are `?Send`
//! because the browser backend holds JS handles.

use async_trait::async_trait;
use serde_json::Value;

use crate::{DbConfig, StoreResult};

/// Open/close/delete plus single-record put and get over named tables
#[async_trait(?Send)]
pub trait KeyValueStore {
    /// The configuration the store was built with, including tables added later
    fn config(&self) -> DbConfig;

    /// Open the database, running the version upgrade if one is needed.
    ///
    /// Returns at once when the store is already open or opening.
    async fn open(&self) -> StoreResult<()>;

    /// Release the handle. Later operations need a fresh `open`.
    fn close(&self);

    /// Destroy the whole database.
    async fn delete(&self) -> StoreResult<()>;

    /// Create a table after the fact. No-op when it already exists.
    async fn create_table(&self, name: &str, primary_key: &str) -> StoreResult<()>;

    /// Upsert one record. Failures are logged, never returned.
    async fn put(&self, table: &str, record: &Value);

    /// Fetch one record by primary-key value.
    async fn query(&self, table: &str, key: &str) -> StoreResult<Option<Value>>;
}
