//! Store Errors

use thiserror::Error;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`crate::KeyValueStore`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The host has no usable local database (no window, private mode, ...)
    #[error("local database unavailable: {0}")]
    Unavailable(String),

    #[error("failed to open database {name}: {reason}")]
    Open { name: String, reason: String },

    /// The stored database is newer than the version asked for
    #[error("database {name} is at version {current}, cannot open version {requested}")]
    VersionTooLow {
        name: String,
        requested: u32,
        current: u32,
    },

    #[error("database is not open")]
    NotOpen,

    #[error("empty key")]
    EmptyKey,

    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// The record carries no usable value under the table's primary key
    #[error("record has no value for primary key {primary_key} in table {table}")]
    MissingKey { table: String, primary_key: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for StoreError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
