//! Scoped undo transactions and batches.
//!
//! Both guards borrow the workspace mutably and dereference to it, so code
//! inside a transaction keeps calling workspace methods as usual. Dropping a
//! [`Transaction`] commits it; [`Transaction::cancel`] reverts everything
//! recorded since it began. Transactions nest and flatten into the
//! outermost undo entry.

use std::ops::{Deref, DerefMut};

use log::{debug, warn};

use crate::{error::Result, workspace::Workspace};

/// An open undo transaction.
///
/// # Examples
///
/// ```
/// use schemata::Workspace;
///
/// let mut workspace = Workspace::default();
/// {
///     let mut tx = workspace.transaction("Create model");
///     tx.create_model("inventory").unwrap();
/// } // committed here
/// assert_eq!(workspace.undo_labels(), vec!["Create model".to_string()]);
/// ```
#[must_use = "a transaction commits as soon as it is dropped"]
pub struct Transaction<'a> {
    workspace: &'a mut Workspace,
    finished: bool,
}

impl<'a> Transaction<'a> {
    fn new(workspace: &'a mut Workspace, label: String) -> Self {
        debug!(label = label.as_str(); "Begin transaction");
        workspace.freeze();
        workspace.store.undo_log().begin(label);
        Self {
            workspace,
            finished: false,
        }
    }

    /// Commits the transaction.
    pub fn commit(mut self) {
        self.finish_commit();
    }

    /// Reverts every change made since the transaction began.
    pub fn cancel(mut self) {
        self.finish_cancel();
    }

    fn finish_commit(&mut self) {
        self.finished = true;
        let workspace = &mut *self.workspace;
        workspace.pump();
        if let Some(label) = workspace.store.undo_log().commit() {
            debug!(label = label.as_str(); "Committed undo entry");
        }
        workspace.thaw();
    }

    fn finish_cancel(&mut self) {
        self.finished = true;
        let workspace = &mut *self.workspace;
        workspace.pump();
        let records = workspace.store.undo_log().cancel();
        debug!(records = records.len(); "Cancelling transaction");
        workspace.replay(records);
        workspace.thaw();
    }
}

impl Deref for Transaction<'_> {
    type Target = Workspace;

    fn deref(&self) -> &Workspace {
        self.workspace
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Workspace {
        self.workspace
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if std::thread::panicking() {
                warn!("Transaction dropped during panic, committing");
            }
            self.finish_commit();
        }
    }
}

/// Defers layer tree rebuilds and coalesces refresh requests until the
/// outermost batch ends.
#[must_use = "a batch ends as soon as it is dropped"]
pub struct Batch<'a> {
    workspace: &'a mut Workspace,
}

impl Deref for Batch<'_> {
    type Target = Workspace;

    fn deref(&self) -> &Workspace {
        self.workspace
    }
}

impl DerefMut for Batch<'_> {
    fn deref_mut(&mut self) -> &mut Workspace {
        self.workspace
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        self.workspace.thaw();
    }
}

impl Workspace {
    /// Opens an undo transaction labelled `label`.
    pub fn transaction(&mut self, label: impl Into<String>) -> Transaction<'_> {
        Transaction::new(self, label.into())
    }

    /// Opens a batch.
    pub fn batch(&mut self) -> Batch<'_> {
        self.freeze();
        Batch { workspace: self }
    }

    /// Runs `f` in a transaction, committing on success and cancelling on
    /// error. Failures are reported through the status log.
    pub fn run_transaction<T>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Workspace) -> Result<T>,
    ) -> Result<T> {
        let mut tx = self.transaction(label);
        match f(&mut tx) {
            Ok(value) => {
                tx.commit();
                Ok(value)
            }
            Err(err) => {
                tx.cancel();
                self.set_status(format!("{label} failed: {err}"));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{change::RefreshKind, workspace::Workspace};

    #[test]
    fn test_drop_commits() {
        let mut workspace = Workspace::default();
        {
            let mut tx = workspace.transaction("Create model");
            tx.create_model("m").unwrap();
        }
        assert!(workspace.can_undo());
        assert_eq!(workspace.store().models().count(), 1);
    }

    #[test]
    fn test_cancel_reverts() {
        let mut workspace = Workspace::default();
        let tx = {
            let mut tx = workspace.transaction("Create model");
            tx.create_model("m").unwrap();
            tx
        };
        tx.cancel();
        assert!(!workspace.can_undo());
        assert_eq!(workspace.store().models().count(), 0);
    }

    #[test]
    fn test_nested_cancel_keeps_outer_work() {
        let mut workspace = Workspace::default();
        {
            let mut outer = workspace.transaction("Outer");
            outer.create_model("kept").unwrap();
            let mut inner = outer.transaction("Inner");
            inner.create_model("dropped").unwrap();
            inner.cancel();
        }
        let names: Vec<&str> = workspace.store().models().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["kept"]);
        assert_eq!(workspace.undo_labels(), vec!["Outer".to_string()]);
    }

    #[test]
    fn test_batch_coalesces_refresh_requests() {
        let mut workspace = Workspace::default();
        let model = workspace.create_model("m").unwrap();
        workspace.take_refresh_requests();
        {
            let mut batch = workspace.batch();
            batch.rename_model(model, "a").unwrap();
            batch.rename_model(model, "b").unwrap();
            assert!(batch.take_refresh_requests().is_empty());
        }
        let requests = workspace.take_refresh_requests();
        let model_requests = requests
            .iter()
            .filter(|r| r.kind() == RefreshKind::Model)
            .count();
        assert_eq!(model_requests, 1);
    }

    #[test]
    fn test_failed_transaction_reports_status() {
        let mut workspace = Workspace::default();
        let result: crate::Result<()> = workspace.run_transaction("Explode", |ws| {
            ws.create_model("m")?;
            Err(crate::SchemataError::invalid("boom"))
        });
        assert!(result.is_err());
        assert_eq!(workspace.store().models().count(), 0);
        assert_eq!(
            workspace.last_status(),
            Some("Explode failed: invalid operation: boom")
        );
    }
}
