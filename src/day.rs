//! Day Keys
//!
//! The record key for a calendar day: `YYYY-M-D` with no zero padding.

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayKey(String);

impl DayKey {
    /// Key for today's local date
    pub fn today() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{}-{}-{}", date.year(), date.month(), date.day()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
