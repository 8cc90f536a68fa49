//! Application Configuration
//!
//! Built once at startup. Defaults describe the persisted layout: database
//! `todolist` v1 with a `tododata` table keyed by `date`.

use idb_store::{DbConfig, TableSchema};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const TODO_TABLE: &str = "tododata";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub database: DbConfig,
    /// Table holding one record per day
    pub todo_table: String,
    #[serde(with = "level_filter")]
    pub log_level: LevelFilter,
    /// Lines kept by the in-page log buffer
    pub log_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DbConfig {
                tables: vec![TableSchema::new(TODO_TABLE, "date")],
                ..DbConfig::default()
            },
            todo_table: TODO_TABLE.to_string(),
            log_level: if cfg!(debug_assertions) {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
            log_capacity: rolling_logger::DEFAULT_CAPACITY,
        }
    }
}

mod level_filter {
    use log::LevelFilter;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(level: &LevelFilter, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(level.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LevelFilter, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = AppConfig::default();
        assert_eq!(config.database.name, "todolist");
        assert_eq!(config.database.version, 1);
        let table = config.database.table(&config.todo_table).unwrap();
        assert_eq!(table.primary_key, "date");
        assert!(!table.auto_increment);
    }

    #[test]
    fn test_partial_override() {
        let config: AppConfig = serde_json::from_str(r#"{"logLevel":"warn"}"#).unwrap();
        assert_eq!(config.log_level, LevelFilter::Warn);
        assert_eq!(config.todo_table, TODO_TABLE);
    }

    #[test]
    fn test_bad_level_rejected() {
        assert!(serde_json::from_str::<AppConfig>(r#"{"logLevel":"loud"}"#).is_err());
    }
}
