//! Application Context
//!
//! Built once by the root component and shared via the Leptos Context API.
//! Wraps the list controller in a signal and forwards every change to the
//! save queue.

use leptos::prelude::*;

use crate::controller::{Action, ListController};
use crate::list::{ItemId, Row};
use crate::persist::SaveQueue;

#[derive(Clone, Copy)]
pub struct AppContext {
    controller: RwSignal<ListController>,
    saves: StoredValue<SaveQueue>,
}

impl AppContext {
    pub fn new(controller: ListController, saves: SaveQueue) -> Self {
        Self {
            controller: RwSignal::new(controller),
            saves: StoredValue::new(saves),
        }
    }

    /// Mutate, re-render, then hand the snapshot to the save queue.
    /// Returns whether anything changed.
    fn dispatch(&self, action: Action) -> bool {
        let mut saved = None;
        self.controller.maybe_update(|c| {
            saved = c.apply(action);
            saved.is_some()
        });

        match saved {
            Some(record) => {
                self.saves.with_value(|q| q.enqueue(record));
                true
            }
            None => false,
        }
    }

    pub fn add(&self, text: String) -> bool {
        self.dispatch(Action::Add(text))
    }

    pub fn delete(&self, id: ItemId) {
        self.dispatch(Action::Delete(id));
    }

    pub fn toggle(&self, id: ItemId) {
        self.dispatch(Action::Toggle(id));
    }

    pub fn rows(&self) -> Vec<Row> {
        self.controller.with(|c| c.list().rows())
    }

    pub fn remaining(&self) -> usize {
        self.controller.with(|c| c.list().remaining())
    }

    pub fn day(&self) -> String {
        self.controller.with_untracked(|c| c.day().to_string())
    }
}
