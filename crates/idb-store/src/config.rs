//! Database Configuration
//!
//! Declares the database name, its schema version and the tables the
//! version upgrade must ensure.

use serde::{Deserialize, Serialize};

/// Primary key used when a table does not declare one
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// One table (object store) declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub name: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub auto_increment: bool,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            auto_increment: false,
        }
    }

    pub fn auto_increment(mut self, enabled: bool) -> Self {
        self.auto_increment = enabled;
        self
    }
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

/// Database declaration handed to a store at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub name: String,
    pub version: u32,
    pub tables: Vec<TableSchema>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            name: "todolist".to_string(),
            version: 1,
            tables: vec![TableSchema::new("demo", DEFAULT_PRIMARY_KEY).auto_increment(true)],
        }
    }
}

impl DbConfig {
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}
