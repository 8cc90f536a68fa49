//! Frontend Models
//!
//! Data structures persisted to the local database.

use serde::{Deserialize, Serialize};

/// One task on the day's list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl Item {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

/// The stored record for one calendar day, keyed by `date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: String,
    #[serde(default)]
    pub items: Vec<Item>,
}
