//! Daylist App
//!
//! Startup sequence and the root component.

use std::rc::Rc;

use idb_store::{IdbStore, KeyValueStore};
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::components::{TodoInput, TodoListView};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::controller::ListController;
use crate::day::DayKey;
use crate::persist::{load_day, run_writer, SaveQueue};

#[component]
pub fn App(controller: ListController, saves: SaveQueue) -> impl IntoView {
    let ctx = AppContext::new(controller, saves);
    provide_context(ctx);

    view! {
        <main class="todo-app">
            <header class="todo-header">
                <h1>{ctx.day()}</h1>
                <p class="item-count">{move || format!("{} left", ctx.remaining())}</p>
            </header>

            <TodoInput />

            <TodoListView />
        </main>
    }
}

/// Open the database, load today's record, start the save writer and mount.
///
/// A failed open or load is logged and stops startup; nothing is mounted.
pub async fn start(config: AppConfig) {
    let day = DayKey::today();

    let store = Rc::new(IdbStore::new(config.database.clone()));
    if let Err(e) = store.open().await {
        log::error!("[APP] Database did not open, startup halted: {}", e);
        return;
    }

    let record = match load_day(&*store, &config.todo_table, &day).await {
        Ok(record) => record,
        Err(e) => {
            log::error!("[APP] Could not load {}, startup halted: {}", day, e);
            return;
        }
    };
    log::info!(
        "[APP] Loaded {} with {} items",
        day,
        record.as_ref().map_or(0, |r| r.items.len())
    );

    let controller = ListController::from_record(day, record);
    let (saves, rx) = SaveQueue::new();
    spawn_local(run_writer(store, config.todo_table, rx));

    mount_to_body(move || view! { <App controller=controller saves=saves /> });
}
