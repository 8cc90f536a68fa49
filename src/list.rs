//! Todo List
//!
//! The in-memory list for one day. Every item gets a session-local id when
//! it enters the list; positions are derived from order and only used for
//! display or by index-addressed callers.

use crate::models::Item;

/// Stable id of an item for the lifetime of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: ItemId,
    pub item: Item,
}

/// Result of an add attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(ItemId),
    /// Nothing left after trimming
    Empty,
    /// An item with the same text already exists
    Duplicate,
}

/// One rendered row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: ItemId,
    pub index: usize,
    /// 1-based ordinal followed by the text, e.g. `"1. Buy milk"`
    pub label: String,
    pub done: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoList {
    entries: Vec<Entry>,
    next_id: u32,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        let mut list = Self::new();
        for item in items {
            let id = list.allocate_id();
            list.entries.push(Entry { id, item });
        }
        list
    }

    fn allocate_id(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId(self.next_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Items in list order, as persisted
    pub fn items(&self) -> Vec<Item> {
        self.entries.iter().map(|e| e.item.clone()).collect()
    }

    /// Count of items not yet done
    pub fn remaining(&self) -> usize {
        self.entries.iter().filter(|e| !e.item.done).count()
    }

    /// Insert a new item at the front.
    ///
    /// The text is trimmed first. Empty text and exact duplicates of an
    /// existing item's text are rejected.
    pub fn add(&mut self, raw: &str) -> AddOutcome {
        let text = raw.trim();
        if text.is_empty() {
            return AddOutcome::Empty;
        }
        if self.entries.iter().any(|e| e.item.text == text) {
            return AddOutcome::Duplicate;
        }

        let id = self.allocate_id();
        self.entries.insert(
            0,
            Entry {
                id,
                item: Item::new(text),
            },
        );
        AddOutcome::Added(id)
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.position(id)?;
        self.remove_at(index)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Item> {
        if index >= self.entries.len() {
            return None;
        }
        Some(self.entries.remove(index).item)
    }

    /// Flip the done flag, returning the new value
    pub fn toggle(&mut self, id: ItemId) -> Option<bool> {
        let index = self.position(id)?;
        self.toggle_at(index)
    }

    pub fn toggle_at(&mut self, index: usize) -> Option<bool> {
        let entry = self.entries.get_mut(index)?;
        entry.item.done = !entry.item.done;
        Some(entry.item.done)
    }

    pub fn rows(&self) -> Vec<Row> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, e)| Row {
                id: e.id,
                index,
                label: format!("{}. {}", index + 1, e.item.text),
                done: e.item.done,
            })
            .collect()
    }
}
