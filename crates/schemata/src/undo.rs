//! Transactional undo log.
//!
//! The log stores *prior images*: before the store changes an entity it
//! hands the log a [`Record`] holding the entity as it was (or `None` if it
//! did not exist). Reverting a record puts that image back and yields the
//! opposite record, which is what makes undo, redo and cancellation the
//! same operation applied in different directions.
//!
//! Transactions nest strictly. Each `begin` pushes a mark into the pending
//! record list; `cancel` reverts and discards everything after the newest
//! mark; `commit` of the outermost transaction moves all pending records
//! into one undo entry, so nested transactions flatten into their parent.

use std::collections::VecDeque;

use schemata_core::{
    catalog::{CatalogObject, Model},
    diagram::{Connection, Diagram, Figure, Layer},
    identifier::{ConnectionId, DiagramId, FigureId, LayerId, ModelId, ObjectId},
};

/// Prior image of one entity.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Record {
    Model(ModelId, Option<Model>),
    Object(ObjectId, Option<CatalogObject>),
    Diagram(DiagramId, Option<Diagram>),
    Layer(LayerId, Option<Layer>),
    Figure(FigureId, Option<Figure>),
    Connection(ConnectionId, Option<Connection>),
}

/// One undoable step as shown to the user.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    label: String,
    /// Records in the order they were taken; reverted back to front.
    records: Vec<Record>,
}

impl Entry {
    pub(crate) fn new(label: String, records: Vec<Record>) -> Self {
        Self { label, records }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn into_records(self) -> Vec<Record> {
        self.records
    }
}

#[derive(Debug)]
struct Mark {
    label: String,
    position: usize,
}

/// Undo and redo stacks plus the records of the open transaction.
#[derive(Debug)]
pub(crate) struct UndoLog {
    pending: Vec<Record>,
    marks: Vec<Mark>,
    undo: VecDeque<Entry>,
    redo: Vec<Entry>,
    limit: usize,
}

impl UndoLog {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            marks: Vec::new(),
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Returns the number of open transactions.
    pub(crate) fn depth(&self) -> usize {
        self.marks.len()
    }

    pub(crate) fn begin(&mut self, label: impl Into<String>) {
        self.marks.push(Mark {
            label: label.into(),
            position: self.pending.len(),
        });
    }

    /// Stores a prior image if a transaction is open.
    pub(crate) fn record(&mut self, record: Record) {
        if !self.marks.is_empty() {
            self.pending.push(record);
        }
    }

    /// Closes the innermost transaction.
    ///
    /// Returns the label of the entry pushed onto the undo stack when the
    /// outermost transaction commits with at least one record.
    pub(crate) fn commit(&mut self) -> Option<String> {
        let mark = self.marks.pop()?;
        if !self.marks.is_empty() || self.pending.is_empty() {
            return None;
        }
        let records = std::mem::take(&mut self.pending);
        self.push_undo(Entry::new(mark.label.clone(), records));
        self.redo.clear();
        Some(mark.label)
    }

    /// Closes the innermost transaction and hands back its records.
    ///
    /// The caller must revert the returned records back to front.
    pub(crate) fn cancel(&mut self) -> Vec<Record> {
        match self.marks.pop() {
            Some(mark) => self.pending.split_off(mark.position),
            None => Vec::new(),
        }
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Entry> {
        self.undo.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Entry> {
        self.redo.pop()
    }

    /// Pushes an entry produced by redoing, keeping the redo stack intact.
    pub(crate) fn push_undo(&mut self, entry: Entry) {
        self.undo.push_back(entry);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    pub(crate) fn push_redo(&mut self, entry: Entry) {
        self.redo.push(entry);
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub(crate) fn undo_labels(&self) -> impl Iterator<Item = &str> {
        self.undo.iter().rev().map(Entry::label)
    }

    pub(crate) fn redo_labels(&self) -> impl Iterator<Item = &str> {
        self.redo.iter().rev().map(Entry::label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: u64) -> Record {
        Record::Model(ModelId::from_raw(raw), None)
    }

    #[test]
    fn test_records_outside_transaction_are_dropped() {
        let mut log = UndoLog::new(10);
        log.record(record(1));
        assert_eq!(log.depth(), 0);
        assert!(!log.can_undo());
    }

    #[test]
    fn test_nested_transactions_flatten() {
        let mut log = UndoLog::new(10);
        log.begin("outer");
        log.record(record(1));
        log.begin("inner");
        log.record(record(2));
        assert_eq!(log.commit(), None);
        log.record(record(3));
        assert_eq!(log.commit().as_deref(), Some("outer"));

        let entry = log.pop_undo().unwrap();
        assert_eq!(entry.label(), "outer");
        assert_eq!(entry.into_records(), vec![record(1), record(2), record(3)]);
    }

    #[test]
    fn test_cancel_returns_only_inner_records() {
        let mut log = UndoLog::new(10);
        log.begin("outer");
        log.record(record(1));
        log.begin("inner");
        log.record(record(2));
        log.record(record(3));

        assert_eq!(log.cancel(), vec![record(2), record(3)]);
        assert_eq!(log.depth(), 1);
        log.commit();

        let entry = log.pop_undo().unwrap();
        assert_eq!(entry.into_records(), vec![record(1)]);
    }

    #[test]
    fn test_empty_transaction_creates_no_entry() {
        let mut log = UndoLog::new(10);
        log.begin("noop");
        assert_eq!(log.commit(), None);
        assert!(!log.can_undo());
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut log = UndoLog::new(10);
        log.push_redo(Entry::new("old".to_string(), vec![record(1)]));
        log.begin("new");
        log.record(record(2));
        log.commit();
        assert!(!log.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut log = UndoLog::new(2);
        for label in ["a", "b", "c"] {
            log.begin(label);
            log.record(record(1));
            log.commit();
        }
        let labels: Vec<&str> = log.undo_labels().collect();
        assert_eq!(labels, vec!["c", "b"]);
    }

    #[test]
    fn test_cancel_without_transaction() {
        let mut log = UndoLog::new(2);
        assert!(log.cancel().is_empty());
        assert_eq!(log.commit(), None);
    }
}
