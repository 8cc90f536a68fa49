//! Persistence
//!
//! Loading a day's record, and the save queue. Callers enqueue snapshots
//! without waiting; a single writer task drains the queue into `put`, so
//! writes land in the order they were issued and the last snapshot wins.

use std::rc::Rc;

use futures::channel::mpsc;
use futures::StreamExt;
use idb_store::{KeyValueStore, StoreResult};

use crate::day::DayKey;
use crate::models::DayRecord;

/// Fetch the stored record for `day`, if any
pub async fn load_day<S>(store: &S, table: &str, day: &DayKey) -> StoreResult<Option<DayRecord>>
where
    S: KeyValueStore + ?Sized,
{
    match store.query(table, day.as_str()).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Sending half of the save queue
#[derive(Clone)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<DayRecord>,
}

impl SaveQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DayRecord>) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx)
    }

    /// Queue a snapshot for saving. Never blocks.
    pub fn enqueue(&self, record: DayRecord) {
        if let Err(e) = self.tx.unbounded_send(record) {
            log::warn!("save dropped, writer is gone: {}", e.into_send_error());
        }
    }
}

/// Drain the queue into `table` until every sender is dropped.
pub async fn run_writer<S>(store: Rc<S>, table: String, mut rx: mpsc::UnboundedReceiver<DayRecord>)
where
    S: KeyValueStore + ?Sized,
{
    while let Some(record) = rx.next().await {
        match serde_json::to_value(&record) {
            Ok(value) => {
                log::debug!("saving {} ({} items)", record.date, record.items.len());
                store.put(&table, &value).await;
            }
            Err(e) => log::warn!("could not serialize {}: {}", record.date, e),
        }
    }
    log::debug!("save writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::controller::{Action, ListController};
    use crate::models::Item;
    use chrono::NaiveDate;
    use idb_store::{MemoryBackend, MemoryStore, StoreError};
    use serde_json::json;

    fn day() -> DayKey {
        DayKey::from_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
    }

    async fn open_store(backend: &MemoryBackend) -> Rc<MemoryStore> {
        let store = backend.store(AppConfig::default().database);
        store.open().await.unwrap();
        Rc::new(store)
    }

    #[tokio::test]
    async fn test_load_missing_day() {
        let store = open_store(&MemoryBackend::new()).await;
        assert_eq!(load_day(&*store, "tododata", &day()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_propagates_errors() {
        let store = MemoryStore::new(AppConfig::default().database);
        assert_eq!(
            load_day(&store, "tododata", &day()).await,
            Err(StoreError::NotOpen)
        );
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_record() {
        let store = open_store(&MemoryBackend::new()).await;
        store.put("tododata", &json!({"date": "2024-3-5", "items": "nope"})).await;
        assert!(matches!(
            load_day(&*store, "tododata", &day()).await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_writes_land_in_order() {
        let store = open_store(&MemoryBackend::new()).await;
        let (queue, rx) = SaveQueue::new();

        let mut controller = ListController::from_record(day(), None);
        for text in ["a", "b", "c"] {
            if let Some(record) = controller.apply(Action::Add(text.to_string())) {
                queue.enqueue(record);
            }
        }
        drop(queue);

        run_writer(store.clone(), "tododata".to_string(), rx).await;

        let saved = load_day(&*store, "tododata", &day()).await.unwrap().unwrap();
        assert_eq!(saved, controller.record());
        assert_eq!(
            saved.items,
            vec![Item::new("c"), Item::new("b"), Item::new("a")]
        );
    }

    #[tokio::test]
    async fn test_round_trip_through_reload() {
        let backend = MemoryBackend::new();
        let store = open_store(&backend).await;
        let (queue, rx) = SaveQueue::new();

        let mut controller = ListController::from_record(day(), None);
        for action in [Action::Add("Buy milk".into()), Action::Add("Walk dog".into())] {
            if let Some(record) = controller.apply(action) {
                queue.enqueue(record);
            }
        }
        let milk = controller.list().entries()[1].id;
        if let Some(record) = controller.apply(Action::Toggle(milk)) {
            queue.enqueue(record);
        }
        drop(queue);
        run_writer(store.clone(), "tododata".to_string(), rx).await;
        store.close();

        // Next page load
        let reopened = open_store(&backend).await;
        let loaded = load_day(&*reopened, "tododata", &day()).await.unwrap();
        let restored = ListController::from_record(day(), loaded);

        assert_eq!(restored.list().items(), controller.list().items());
        assert_eq!(backend.upgrade_count("todolist"), 1);
    }

    #[tokio::test]
    async fn test_enqueue_after_writer_gone() {
        let (queue, rx) = SaveQueue::new();
        drop(rx);
        // Logged and dropped, no panic
        queue.enqueue(DayRecord {
            date: "2024-3-5".to_string(),
            items: vec![],
        });
    }
}
