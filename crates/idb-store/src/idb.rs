//! IndexedDB Store
//!
//! [`KeyValueStore`] over the browser's IndexedDB using raw web-sys
//! bindings. Callback-style requests are bridged to futures through a
//! oneshot channel fired from the request's `onsuccess`/`onerror` handlers.
//!
//! Records are converted with the JSON-compatible serde-wasm-bindgen
//! serializer so objects reach IndexedDB as plain JS objects and key paths
//! resolve against them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    DomException, Event, IdbDatabase, IdbFactory, IdbObjectStoreParameters, IdbRequest,
    IdbTransactionMode, IdbVersionChangeEvent,
};

use crate::key::RecordKey;
use crate::{DbConfig, KeyValueStore, StoreError, StoreResult, TableSchema};

enum Connection {
    Closed,
    Opening,
    Open(IdbDatabase),
}

/// IndexedDB-backed store. Clones share one connection.
#[derive(Clone)]
pub struct IdbStore {
    config: Rc<RefCell<DbConfig>>,
    conn: Rc<RefCell<Connection>>,
    upgrades: Rc<Cell<u32>>,
}

impl Default for IdbStore {
    fn default() -> Self {
        Self::new(DbConfig::default())
    }
}

impl IdbStore {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config: Rc::new(RefCell::new(config)),
            conn: Rc::new(RefCell::new(Connection::Closed)),
            upgrades: Rc::new(Cell::new(0)),
        }
    }

    /// Version upgrades this store has run since it was created
    pub fn upgrade_count(&self) -> u32 {
        self.upgrades.get()
    }

    fn database(&self) -> StoreResult<IdbDatabase> {
        match &*self.conn.borrow() {
            Connection::Open(db) => Ok(db.clone()),
            _ => Err(StoreError::NotOpen),
        }
    }

    /// Numeric keys for auto-increment tables, string keys otherwise
    fn key_value(&self, table: &str, key: &str) -> JsValue {
        let numeric = self
            .config
            .borrow()
            .table(table)
            .map(|t| t.auto_increment)
            .unwrap_or(false);
        match RecordKey::lookup(key, numeric) {
            RecordKey::Number(n) => n
                .parse::<f64>()
                .map(JsValue::from_f64)
                .unwrap_or_else(|_| JsValue::from_str(&n)),
            RecordKey::Text(s) => JsValue::from_str(&s),
        }
    }

    async fn try_put(&self, table: &str, record: &Value) -> StoreResult<()> {
        let db = self.database()?;
        if !db.object_store_names().contains(table) {
            return Err(StoreError::UnknownTable(table.to_string()));
        }

        let value = to_js(record)?;
        let tx = db
            .transaction_with_str_and_mode(table, IdbTransactionMode::Readwrite)
            .map_err(request_error)?;
        let store = tx.object_store(table).map_err(request_error)?;
        let request = store.put(&value).map_err(request_error)?;

        wait_for_request(&request).await.map_err(StoreError::Request)?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl KeyValueStore for IdbStore {
    fn config(&self) -> DbConfig {
        self.config.borrow().clone()
    }

    async fn open(&self) -> StoreResult<()> {
        if !matches!(*self.conn.borrow(), Connection::Closed) {
            return Ok(());
        }
        *self.conn.borrow_mut() = Connection::Opening;

        let config = self.config();
        match open_database(&config, self.upgrades.clone()).await {
            Ok(db) => {
                log::info!("Opened IndexedDB {} v{}", config.name, config.version);
                *self.conn.borrow_mut() = Connection::Open(db);
                Ok(())
            }
            Err(e) => {
                log::error!("open error: {}", e);
                *self.conn.borrow_mut() = Connection::Closed;
                Err(e)
            }
        }
    }

    fn close(&self) {
        let previous = std::mem::replace(&mut *self.conn.borrow_mut(), Connection::Closed);
        if let Connection::Open(db) = previous {
            db.close();
        }
    }

    async fn delete(&self) -> StoreResult<()> {
        self.close();

        let name = self.config.borrow().name.clone();
        let factory = idb_factory()?;
        let request = factory.delete_database(&name).map_err(request_error)?;
        wait_for_request(&request).await.map_err(StoreError::Request)?;

        log::info!("Deleted IndexedDB {}", name);
        Ok(())
    }

    async fn create_table(&self, name: &str, primary_key: &str) -> StoreResult<()> {
        let db = self.database()?;
        if db.object_store_names().contains(name) {
            return Ok(());
        }

        // Object stores can only be created inside a versionchange transaction
        let next_version = db.version() as u32 + 1;
        let previous = self.config();
        {
            let mut config = self.config.borrow_mut();
            config.version = next_version;
            if config.table(name).is_none() {
                config.tables.push(TableSchema::new(name, primary_key));
            }
        }

        self.close();
        if let Err(e) = self.open().await {
            // Fall back to the schema that was working
            *self.config.borrow_mut() = previous;
            if let Err(reopen) = self.open().await {
                log::error!("reopen after failed create_table: {}", reopen);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn put(&self, table: &str, record: &Value) {
        match self.try_put(table, record).await {
            Ok(()) => log::debug!("put into {} succeeded", table),
            Err(e) => log::warn!("put into {} failed: {}", table, e),
        }
    }

    async fn query(&self, table: &str, key: &str) -> StoreResult<Option<Value>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let db = self.database()?;
        if !db.object_store_names().contains(table) {
            return Err(StoreError::UnknownTable(table.to_string()));
        }

        let tx = db
            .transaction_with_str_and_mode(table, IdbTransactionMode::Readonly)
            .map_err(request_error)?;
        let store = tx.object_store(table).map_err(request_error)?;
        let request = store
            .get(&self.key_value(table, key))
            .map_err(request_error)?;

        let result = wait_for_request(&request).await.map_err(StoreError::Request)?;
        from_js(result)
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn idb_factory() -> StoreResult<IdbFactory> {
    let window =
        web_sys::window().ok_or_else(|| StoreError::Unavailable("no window object".to_string()))?;
    window
        .indexed_db()
        .map_err(|e| StoreError::Unavailable(js_error(&e)))?
        .ok_or_else(|| StoreError::Unavailable("IndexedDB not available".to_string()))
}

/// Opens the database, creating declared tables in the upgrade if needed.
async fn open_database(config: &DbConfig, upgrades: Rc<Cell<u32>>) -> StoreResult<IdbDatabase> {
    let open_failed = |reason: String| StoreError::Open {
        name: config.name.clone(),
        reason,
    };

    let factory = idb_factory()?;
    let request = factory
        .open_with_u32(&config.name, config.version)
        .map_err(|e| open_failed(js_error(&e)))?;

    let tables = config.tables.clone();
    let version = config.version;
    let upgrade_request = request.clone();
    let on_upgrade = Closure::once(move |event: IdbVersionChangeEvent| {
        let Some(db) = upgrade_request
            .result()
            .ok()
            .and_then(|r| r.dyn_into::<IdbDatabase>().ok())
        else {
            log::error!("upgradeneeded fired without a database handle");
            return;
        };
        log::info!(
            "DB version changed from {} to {}",
            event.old_version(),
            version
        );
        upgrades.set(upgrades.get() + 1);
        ensure_tables(&db, &tables);
    });
    request.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));

    let blocked_name = config.name.clone();
    let on_blocked = Closure::once(move |_: Event| {
        log::warn!("open of {} blocked by another connection", blocked_name);
    });
    request.set_onblocked(Some(on_blocked.as_ref().unchecked_ref()));

    let result = wait_for_request(&request).await;

    request.set_onupgradeneeded(None);
    request.set_onblocked(None);
    drop(on_upgrade);
    drop(on_blocked);

    result
        .map_err(open_failed)?
        .dyn_into::<IdbDatabase>()
        .map_err(|_| open_failed("result is not a database".to_string()))
}

fn ensure_tables(db: &IdbDatabase, tables: &[TableSchema]) {
    let existing = db.object_store_names();
    for schema in tables {
        if existing.contains(&schema.name) {
            continue;
        }

        let params = IdbObjectStoreParameters::new();
        params.set_key_path(&JsValue::from_str(&schema.primary_key));
        params.set_auto_increment(schema.auto_increment);

        match db.create_object_store_with_optional_parameters(&schema.name, &params) {
            Ok(_) => log::info!("Created table {} (key: {})", schema.name, schema.primary_key),
            Err(e) => log::error!("Failed to create table {}: {}", schema.name, js_error(&e)),
        }
    }
}

/// Waits for an IDB request to complete.
async fn wait_for_request(request: &IdbRequest) -> Result<JsValue, String> {
    let (tx, rx) = oneshot::channel::<Result<JsValue, String>>();
    let tx = Rc::new(RefCell::new(Some(tx)));

    let success_tx = tx.clone();
    let success_request = request.clone();
    let onsuccess = Closure::wrap(Box::new(move |_: Event| {
        let result = success_request.result().unwrap_or(JsValue::UNDEFINED);
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(result));
        }
    }) as Box<dyn FnMut(_)>);

    let error_tx = tx;
    let error_request = request.clone();
    let onerror = Closure::wrap(Box::new(move |_: Event| {
        let message = error_request
            .error()
            .ok()
            .flatten()
            .map(|e| e.message())
            .unwrap_or_else(|| "unknown error".to_string());
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(message));
        }
    }) as Box<dyn FnMut(_)>);

    request.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
    request.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    let result = rx.await.unwrap_or_else(|_| Err("request dropped".to_string()));

    request.set_onsuccess(None);
    request.set_onerror(None);

    result
}

fn to_js(record: &Value) -> StoreResult<JsValue> {
    Ok(record.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn from_js(value: JsValue) -> StoreResult<Option<Value>> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_wasm_bindgen::from_value(value)?))
}

fn request_error(e: JsValue) -> StoreError {
    StoreError::Request(js_error(&e))
}

fn js_error(e: &JsValue) -> String {
    if let Some(s) = e.as_string() {
        return s;
    }
    if let Some(ex) = e.dyn_ref::<DomException>() {
        return format!("{}: {}", ex.name(), ex.message());
    }
    format!("{:?}", e)
}
