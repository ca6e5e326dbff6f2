//! # Notification Log
//!
//! The ordered, in-memory list of ingested notifications, newest first.
//!
//! `NotificationLog` is a value: `append` and `toggle_read` return a new log
//! and leave the old one untouched. The reducer swaps `App::log` wholesale, so
//! anything rendering from a snapshot never sees a half-applied change.
//! Cloning is an `Arc` bump.

use std::sync::Arc;

use super::notification::NotificationRecord;

/// Text shown in place of the list when nothing has been ingested.
pub const EMPTY_STATE_TEXT: &str = "No notifications yet";

#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    records: Arc<[NotificationRecord]>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&NotificationRecord> {
        self.records.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    /// A new log with `record` at the front.
    pub fn append(&self, record: NotificationRecord) -> Self {
        debug_assert!(self.position(&record.id).is_none(), "duplicate record id");
        let records: Vec<NotificationRecord> = std::iter::once(record)
            .chain(self.records.iter().cloned())
            .collect();
        Self {
            records: records.into(),
        }
    }

    /// A new log with the matching record's `read` flag flipped in place.
    /// Returns an identical log when no record has that id.
    pub fn toggle_read(&self, id: &str) -> Self {
        let Some(index) = self.position(id) else {
            return self.clone();
        };
        let records: Vec<NotificationRecord> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| if i == index { r.toggled() } else { r.clone() })
            .collect();
        Self {
            records: records.into(),
        }
    }

    /// Cards in display order. Each call starts from the top.
    pub fn render(&self) -> Cards<'_> {
        Cards {
            inner: self.records.iter(),
        }
    }

    /// What the log area should show: the empty state, or the cards.
    pub fn surface(&self) -> Surface<'_> {
        if self.is_empty() {
            Surface::Empty
        } else {
            Surface::Cards(self.render())
        }
    }
}

/// Visual weight of a card, derived from its `read` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// Unread: drawn with an accent border.
    Highlighted,
    /// Read: drawn faded.
    Dimmed,
}

impl Emphasis {
    pub fn of(record: &NotificationRecord) -> Self {
        if record.read {
            Emphasis::Dimmed
        } else {
            Emphasis::Highlighted
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Card<'a> {
    pub record: &'a NotificationRecord,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone)]
pub struct Cards<'a> {
    inner: std::slice::Iter<'a, NotificationRecord>,
}

impl<'a> Iterator for Cards<'a> {
    type Item = Card<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|record| Card {
            record,
            emphasis: Emphasis::of(record),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Cards<'_> {}

pub enum Surface<'a> {
    Empty,
    Cards(Cards<'a>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn record(id: &str, title: &str) -> NotificationRecord {
        NotificationRecord {
            id: id.to_string(),
            title: title.to_string(),
            message: format!("{title} body"),
            date: "Fri Oct 16 2026".to_string(),
            read: false,
        }
    }

    fn log_of(ids: &[&str]) -> NotificationLog {
        ids.iter()
            .fold(NotificationLog::new(), |log, id| log.append(record(id, id)))
    }

    #[test]
    fn test_render_is_reverse_of_ingestion() {
        let log = log_of(&["1", "2", "3", "4"]);
        let order: Vec<&str> = log.render().map(|c| c.record.id.as_str()).collect();
        assert_eq!(order, vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_append_keeps_duplicate_content() {
        let log = NotificationLog::new()
            .append(record("1", "Same"))
            .append(record("2", "Same"));
        assert_eq!(log.len(), 2);
        let ids: HashSet<&str> = log.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_append_leaves_previous_value_untouched() {
        let before = log_of(&["1"]);
        let after = before.append(record("2", "two"));
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn test_toggle_twice_restores_everything() {
        let log = log_of(&["1", "2", "3"]);
        let once = log.toggle_read("2");
        assert!(once.get(1).unwrap().read);
        assert!(!once.get(0).unwrap().read);
        assert!(!once.get(2).unwrap().read);

        let twice = once.toggle_read("2");
        assert_eq!(twice.records(), log.records());
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let log = log_of(&["1", "2"]);
        let after = log.toggle_read("nope");
        assert_eq!(after.records(), log.records());
    }

    #[test]
    fn test_emphasis_follows_read_flag() {
        let log = log_of(&["1", "2"]).toggle_read("1");
        let emphasis: Vec<Emphasis> = log.render().map(|c| c.emphasis).collect();
        assert_eq!(emphasis, vec![Emphasis::Highlighted, Emphasis::Dimmed]);
        assert_eq!(log.unread_count(), 1);
    }

    #[test]
    fn test_render_is_restartable() {
        let log = log_of(&["1", "2"]);
        let cards = log.render();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards.clone().count(), 2);
        assert_eq!(log.render().count(), 2);
    }

    #[test]
    fn test_surface_empty_vs_cards() {
        assert!(matches!(NotificationLog::new().surface(), Surface::Empty));
        match log_of(&["1"]).surface() {
            Surface::Cards(cards) => assert_eq!(cards.count(), 1),
            Surface::Empty => panic!("expected cards"),
        }
    }
}
