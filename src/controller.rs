//! List Controller
//!
//! Owns the day's list and turns user actions into mutations. Each action
//! that changes the list yields the full record to persist.

use crate::day::DayKey;
use crate::list::{AddOutcome, ItemId, TodoList};
use crate::models::DayRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add(String),
    Delete(ItemId),
    Toggle(ItemId),
}

#[derive(Debug, Clone)]
pub struct ListController {
    day: DayKey,
    list: TodoList,
}

impl ListController {
    pub fn new(day: DayKey, list: TodoList) -> Self {
        Self { day, list }
    }

    /// Controller for `day`, seeded from its stored record if there is one
    pub fn from_record(day: DayKey, record: Option<DayRecord>) -> Self {
        let items = record.map(|r| r.items).unwrap_or_default();
        Self::new(day, TodoList::from_items(items))
    }

    pub fn day(&self) -> &DayKey {
        &self.day
    }

    pub fn list(&self) -> &TodoList {
        &self.list
    }

    /// Apply one action. Returns the snapshot to save when the list changed.
    pub fn apply(&mut self, action: Action) -> Option<DayRecord> {
        let changed = match action {
            Action::Add(text) => match self.list.add(&text) {
                AddOutcome::Added(_) => true,
                AddOutcome::Empty | AddOutcome::Duplicate => {
                    log::debug!("add rejected: {:?}", text);
                    false
                }
            },
            Action::Delete(id) => self.list.remove(id).is_some(),
            Action::Toggle(id) => self.list.toggle(id).is_some(),
        };
        changed.then(|| self.record())
    }

    pub fn record(&self) -> DayRecord {
        DayRecord {
            date: self.day.to_string(),
            items: self.list.items(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use chrono::NaiveDate;

    fn day() -> DayKey {
        DayKey::from_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
    }

    #[test]
    fn test_seeded_from_record() {
        let record = DayRecord {
            date: "2024-3-5".to_string(),
            items: vec![Item::new("a"), Item::new("b")],
        };
        let controller = ListController::from_record(day(), Some(record.clone()));
        assert_eq!(controller.record(), record);
    }

    #[test]
    fn test_missing_record_starts_empty() {
        let controller = ListController::from_record(day(), None);
        assert!(controller.list().is_empty());
        assert_eq!(controller.record().date, "2024-3-5");
    }

    #[test]
    fn test_add_yields_snapshot() {
        let mut controller = ListController::from_record(day(), None);
        let saved = controller.apply(Action::Add("Buy milk".into())).unwrap();
        assert_eq!(saved.date, "2024-3-5");
        assert_eq!(saved.items, vec![Item::new("Buy milk")]);
    }

    #[test]
    fn test_rejected_add_saves_nothing() {
        let mut controller = ListController::from_record(day(), None);
        controller.apply(Action::Add("x".into()));
        assert_eq!(controller.apply(Action::Add("x".into())), None);
        assert_eq!(controller.apply(Action::Add("  ".into())), None);
        assert_eq!(controller.list().len(), 1);
    }

    #[test]
    fn test_toggle_and_delete_by_id() {
        let mut controller = ListController::from_record(day(), None);
        controller.apply(Action::Add("a".into()));
        controller.apply(Action::Add("b".into()));
        let a = controller.list().entries()[1].id;

        let saved = controller.apply(Action::Toggle(a)).unwrap();
        assert_eq!(saved.items[1].done, true);
        assert_eq!(saved.items[0].done, false);

        let saved = controller.apply(Action::Delete(a)).unwrap();
        assert_eq!(saved.items, vec![Item::new("b")]);

        // Stale id is a no-op
        assert_eq!(controller.apply(Action::Toggle(a)), None);
        assert_eq!(controller.apply(Action::Delete(a)), None);
    }
}
