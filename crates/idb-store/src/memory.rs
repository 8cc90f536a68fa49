//! In-Memory Store
//!
//! Same contract and version semantics as the IndexedDB backend, held in
//! process memory. A [`MemoryBackend`] plays the role of the browser's
//! database factory: stores built from the same backend see the same data,
//! so closing and reopening behaves like a page reload.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::key::{record_key, RecordKey};
use crate::{DbConfig, KeyValueStore, StoreError, StoreResult, TableSchema};

#[derive(Debug)]
struct MemoryTable {
    schema: TableSchema,
    next_id: u64,
    rows: BTreeMap<RecordKey, Value>,
}

impl MemoryTable {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }

    fn upsert(&mut self, record: &Value) -> StoreResult<RecordKey> {
        if !record.is_object() {
            return Err(StoreError::Serialization("record must be an object".to_string()));
        }

        let pk = self.schema.primary_key.clone();
        match record_key(record, &pk) {
            Some(key) => {
                // Explicit numeric keys push the generator forward, as IndexedDB does
                if let Some(n) = record.get(&pk).and_then(Value::as_u64) {
                    self.next_id = self.next_id.max(n);
                }
                self.rows.insert(key.clone(), record.clone());
                Ok(key)
            }
            None if self.schema.auto_increment => {
                self.next_id += 1;
                let mut stored = record.clone();
                if let Some(obj) = stored.as_object_mut() {
                    obj.insert(pk, Value::from(self.next_id));
                }
                let key = RecordKey::lookup(&self.next_id.to_string(), true);
                self.rows.insert(key.clone(), stored);
                Ok(key)
            }
            None => Err(StoreError::MissingKey {
                table: self.schema.name.clone(),
                primary_key: pk,
            }),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryDatabase {
    version: u32,
    upgrades: u32,
    tables: BTreeMap<String, MemoryTable>,
}

#[derive(Debug, Default)]
struct BackendState {
    databases: HashMap<String, MemoryDatabase>,
    fail_opens: bool,
    fail_upgrades: bool,
}

/// Shared home of every in-memory database
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Rc<RefCell<BackendState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store for `config` on top of this backend
    pub fn store(&self, config: DbConfig) -> MemoryStore {
        MemoryStore {
            backend: self.clone(),
            config: RefCell::new(config),
            open: Cell::new(false),
        }
    }

    /// Make every following open fail until switched back off
    pub fn fail_opens(&self, fail: bool) {
        self.state.borrow_mut().fail_opens = fail;
    }

    /// Make opens that need a version upgrade fail, as when another
    /// connection blocks the versionchange
    pub fn fail_upgrades(&self, fail: bool) {
        self.state.borrow_mut().fail_upgrades = fail;
    }

    /// Stored schema version, `None` if the database does not exist
    pub fn version(&self, db_name: &str) -> Option<u32> {
        self.state.borrow().databases.get(db_name).map(|db| db.version)
    }

    /// How many version upgrades the database has gone through
    pub fn upgrade_count(&self, db_name: &str) -> u32 {
        self.state
            .borrow()
            .databases
            .get(db_name)
            .map(|db| db.upgrades)
            .unwrap_or(0)
    }

    pub fn table_names(&self, db_name: &str) -> Vec<String> {
        self.state
            .borrow()
            .databases
            .get(db_name)
            .map(|db| db.tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, db_name: &str, table: &str) -> usize {
        self.state
            .borrow()
            .databases
            .get(db_name)
            .and_then(|db| db.tables.get(table))
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }
}

/// A [`KeyValueStore`] living in a [`MemoryBackend`]
pub struct MemoryStore {
    backend: MemoryBackend,
    config: RefCell<DbConfig>,
    open: Cell<bool>,
}

impl MemoryStore {
    /// Store on a private backend of its own
    pub fn new(config: DbConfig) -> Self {
        MemoryBackend::new().store(config)
    }

    pub fn backend(&self) -> &MemoryBackend {
        &self.backend
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    fn with_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut MemoryTable) -> StoreResult<T>,
    ) -> StoreResult<T> {
        if !self.open.get() {
            return Err(StoreError::NotOpen);
        }
        let name = self.config.borrow().name.clone();
        let mut state = self.backend.state.borrow_mut();
        let db = state.databases.get_mut(&name).ok_or(StoreError::NotOpen)?;
        let table = db
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        f(table)
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    fn config(&self) -> DbConfig {
        self.config.borrow().clone()
    }

    async fn open(&self) -> StoreResult<()> {
        if self.open.get() {
            return Ok(());
        }

        let config = self.config.borrow().clone();
        let mut state = self.backend.state.borrow_mut();
        if state.fail_opens {
            log::error!("open error: {}", config.name);
            return Err(StoreError::Open {
                name: config.name,
                reason: "open refused".to_string(),
            });
        }
        if config.version == 0 {
            return Err(StoreError::Open {
                name: config.name,
                reason: "version must be at least 1".to_string(),
            });
        }

        let fail_upgrades = state.fail_upgrades;
        let db = state.databases.entry(config.name.clone()).or_default();
        if config.version < db.version {
            return Err(StoreError::VersionTooLow {
                name: config.name,
                requested: config.version,
                current: db.version,
            });
        }

        if config.version > db.version {
            if fail_upgrades {
                log::error!("upgrade of {} to v{} blocked", config.name, config.version);
                return Err(StoreError::Open {
                    name: config.name,
                    reason: "upgrade blocked".to_string(),
                });
            }
            log::info!("DB {} version changed to {}", config.name, config.version);
            db.version = config.version;
            db.upgrades += 1;
            for schema in &config.tables {
                if !db.tables.contains_key(&schema.name) {
                    log::info!("Created table {} (key: {})", schema.name, schema.primary_key);
                    db.tables
                        .insert(schema.name.clone(), MemoryTable::new(schema.clone()));
                }
            }
        }

        self.open.set(true);
        Ok(())
    }

    fn close(&self) {
        self.open.set(false);
    }

    async fn delete(&self) -> StoreResult<()> {
        self.close();
        let name = self.config.borrow().name.clone();
        self.backend.state.borrow_mut().databases.remove(&name);
        log::info!("Deleted database {}", name);
        Ok(())
    }

    async fn create_table(&self, name: &str, primary_key: &str) -> StoreResult<()> {
        if !self.open.get() {
            return Err(StoreError::NotOpen);
        }
        let db_name = self.config.borrow().name.clone();
        if self.backend.table_names(&db_name).iter().any(|t| t == name) {
            return Ok(());
        }

        // Tables can only appear during an upgrade, so bump the version
        let current = self.backend.version(&db_name).unwrap_or(0);
        let previous = self.config();
        {
            let mut config = self.config.borrow_mut();
            config.version = current + 1;
            if config.table(name).is_none() {
                config.tables.push(TableSchema::new(name, primary_key));
            }
        }
        self.close();
        if let Err(e) = self.open().await {
            // Fall back to the schema that was working
            *self.config.borrow_mut() = previous;
            if let Err(reopen) = self.open().await {
                log::error!("reopen of {} after failed create_table: {}", db_name, reopen);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn put(&self, table: &str, record: &Value) {
        match self.with_table(table, |t| t.upsert(record)) {
            Ok(key) => log::debug!("put {}/{}", table, key),
            Err(e) => log::warn!("put into {} failed: {}", table, e),
        }
    }

    async fn query(&self, table: &str, key: &str) -> StoreResult<Option<Value>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.with_table(table, |t| {
            let key = RecordKey::lookup(key, t.schema.auto_increment);
            Ok(t.rows.get(&key).cloned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn todo_config() -> DbConfig {
        DbConfig {
            tables: vec![TableSchema::new("tododata", "date")],
            ..DbConfig::default()
        }
    }

    #[tokio::test]
    async fn test_open_creates_declared_tables() {
        let store = MemoryStore::new(todo_config());
        store.open().await.expect("open failed");

        assert!(store.is_open());
        assert_eq!(store.backend().version("todolist"), Some(1));
        assert_eq!(store.backend().table_names("todolist"), vec!["tododata".to_string()]);
    }

    #[tokio::test]
    async fn test_open_twice_is_noop() {
        let store = MemoryStore::new(todo_config());
        store.open().await.unwrap();
        store.open().await.unwrap();
        assert_eq!(store.backend().upgrade_count("todolist"), 1);
    }

    #[tokio::test]
    async fn test_put_then_query() {
        let store = MemoryStore::new(todo_config());
        store.open().await.unwrap();

        let record = json!({"date": "2024-3-5", "items": [{"text": "a", "done": false}]});
        store.put("tododata", &record).await;

        let found = store.query("tododata", "2024-3-5").await.unwrap();
        assert_eq!(found, Some(record));
        assert_eq!(store.query("tododata", "2024-3-6").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = MemoryStore::new(todo_config());
        store.open().await.unwrap();

        store.put("tododata", &json!({"date": "d", "items": []})).await;
        store.put("tododata", &json!({"date": "d", "items": [{"text": "x", "done": true}]})).await;

        assert_eq!(store.backend().row_count("todolist", "tododata"), 1);
        let found = store.query("tododata", "d").await.unwrap().unwrap();
        assert_eq!(found["items"][0]["text"], "x");
    }

    #[tokio::test]
    async fn test_auto_increment_assigns_keys() {
        let store = MemoryStore::new(DbConfig::default());
        store.open().await.unwrap();

        store.put("demo", &json!({"note": "first"})).await;
        store.put("demo", &json!({"note": "second"})).await;

        let second = store.query("demo", "2").await.unwrap().unwrap();
        assert_eq!(second, json!({"id": 2, "note": "second"}));
    }

    #[tokio::test]
    async fn test_put_errors_are_swallowed() {
        let store = MemoryStore::new(todo_config());

        // Not open yet
        store.put("tododata", &json!({"date": "d"})).await;
        store.open().await.unwrap();
        // Unknown table, missing key, not an object
        store.put("nope", &json!({"date": "d"})).await;
        store.put("tododata", &json!({"items": []})).await;
        store.put("tododata", &json!("bare string")).await;

        assert_eq!(store.backend().row_count("todolist", "tododata"), 0);
    }

    #[tokio::test]
    async fn test_query_empty_key_rejected() {
        let store = MemoryStore::new(todo_config());
        store.open().await.unwrap();
        assert_eq!(store.query("tododata", "").await, Err(StoreError::EmptyKey));
    }

    #[tokio::test]
    async fn test_query_unknown_table() {
        let store = MemoryStore::new(todo_config());
        store.open().await.unwrap();
        assert_eq!(
            store.query("missing", "k").await,
            Err(StoreError::UnknownTable("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_closed_store_rejects_queries() {
        let store = MemoryStore::new(todo_config());
        store.open().await.unwrap();
        store.close();
        assert_eq!(store.query("tododata", "k").await, Err(StoreError::NotOpen));
    }

    #[tokio::test]
    async fn test_number_and_string_keys_are_distinct() {
        let store = MemoryStore::new(DbConfig {
            tables: vec![TableSchema::new("kv", "k")],
            ..DbConfig::default()
        });
        store.open().await.unwrap();

        store.put("kv", &json!({"k": 7, "from": "number"})).await;
        store.put("kv", &json!({"k": "7", "from": "string"})).await;

        assert_eq!(store.backend().row_count("todolist", "kv"), 2);
        // Lookups on a table without generated keys are by string
        let found = store.query("kv", "7").await.unwrap().unwrap();
        assert_eq!(found["from"], "string");
    }

    #[tokio::test]
    async fn test_failed_open() {
        let backend = MemoryBackend::new();
        backend.fail_opens(true);
        let store = backend.store(todo_config());

        assert!(matches!(store.open().await, Err(StoreError::Open { .. })));
        assert!(!store.is_open());
    }
}
