//! The editing workspace.
//!
//! A [`Workspace`] owns the entity store and every listener of its change
//! feed: the relationship synchronizer, one layer tree per diagram and the
//! refresh queue. The services (placement, clipboard, deletion, catalog
//! editing and layout) are implemented as methods on it in their own
//! modules; each public operation runs inside one undo transaction.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, trace};

use schemata_core::{identifier::DiagramId, kind::FigureKind};

use crate::{
    canvas::{Canvas, GridCanvas},
    change::{Change, RefreshRequest},
    config::{AppConfig, ToolConfig},
    error::{Result, SchemataError},
    layer_tree::LayerTree,
    prompt::{Answer, FixedPrompt, Prompt, Question},
    registry::KindRegistry,
    store::Store,
    sync::Synchronizer,
    undo::{Entry, Record},
};

/// Builder for a [`Workspace`].
///
/// # Examples
///
/// ```
/// use schemata::{WorkspaceBuilder, config::AppConfig};
/// use schemata::prompt::{Answer, FixedPrompt};
///
/// let workspace = WorkspaceBuilder::new(AppConfig::default())
///     .with_prompt(FixedPrompt::new(Answer::No))
///     .build();
/// assert!(!workspace.can_undo());
/// ```
pub struct WorkspaceBuilder {
    config: AppConfig,
    canvas: Option<Box<dyn Canvas>>,
    prompt: Option<Box<dyn Prompt>>,
    registry: Option<KindRegistry>,
}

impl WorkspaceBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            canvas: None,
            prompt: None,
            registry: None,
        }
    }

    /// Sets the canvas; defaults to a [`GridCanvas`] with the configured grid.
    pub fn with_canvas(mut self, canvas: impl Canvas + 'static) -> Self {
        self.canvas = Some(Box::new(canvas));
        self
    }

    /// Sets the confirmation source; defaults to answering `Yes`.
    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Workspace {
        let canvas = self
            .canvas
            .unwrap_or_else(|| Box::new(GridCanvas::new(self.config.canvas().grid_size())));
        let prompt = self
            .prompt
            .unwrap_or_else(|| Box::new(FixedPrompt::default()));
        Workspace {
            store: Store::new(self.config.undo().limit()),
            sync: Synchronizer::new(),
            trees: IndexMap::new(),
            registry: self.registry.unwrap_or_default(),
            config: self.config,
            canvas,
            prompt,
            status: Vec::new(),
            pending_refresh: IndexSet::new(),
            refresh: Vec::new(),
            frozen: 0,
            paste_counts: HashMap::new(),
        }
    }
}

/// Catalog, diagrams and their synchronized views.
pub struct Workspace {
    pub(crate) store: Store,
    pub(crate) sync: Synchronizer,
    pub(crate) trees: IndexMap<DiagramId, LayerTree>,
    pub(crate) registry: KindRegistry,
    pub(crate) config: AppConfig,
    pub(crate) canvas: Box<dyn Canvas>,
    prompt: Box<dyn Prompt>,
    status: Vec<String>,
    /// Refresh requests coalesced while frozen.
    pending_refresh: IndexSet<RefreshRequest>,
    refresh: Vec<RefreshRequest>,
    frozen: usize,
    /// Number of pastes per target diagram, for the paste offset.
    pub(crate) paste_counts: HashMap<DiagramId, u32>,
}

impl Default for Workspace {
    fn default() -> Self {
        WorkspaceBuilder::new(AppConfig::default()).build()
    }
}

impl Workspace {
    pub fn new(config: AppConfig) -> Self {
        WorkspaceBuilder::new(config).build()
    }

    /// Returns the entity store for reading.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the layer tree of `diagram`.
    pub fn tree(&self, diagram: DiagramId) -> Option<&LayerTree> {
        self.trees.get(&diagram)
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut KindRegistry {
        &mut self.registry
    }

    pub fn set_prompt(&mut self, prompt: impl Prompt + 'static) {
        self.prompt = Box::new(prompt);
    }

    /// Returns the effective tool configuration for `kind`.
    pub fn tool_config(&self, kind: FigureKind) -> ToolConfig {
        self.config.tool(kind)
    }

    /// Replaces the tool configuration for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Config`] if the color does not parse.
    pub fn set_tool_config(&mut self, kind: FigureKind, tool: ToolConfig) -> Result<()> {
        tool.color()
            .map_err(|err| SchemataError::Config(format!("invalid color for the {kind} tool: {err}")))?;
        self.config.set_tool(kind, tool);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Status and refresh
    // ---------------------------------------------------------------------

    /// Returns the status message of the most recent operation.
    pub fn last_status(&self) -> Option<&str> {
        self.status.last().map(String::as_str)
    }

    /// Drains all status messages produced so far.
    pub fn take_status(&mut self) -> Vec<String> {
        std::mem::take(&mut self.status)
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(status = message.as_str(); "Status");
        self.status.push(message);
    }

    /// Drains the refresh requests delivered so far.
    pub fn take_refresh_requests(&mut self) -> Vec<RefreshRequest> {
        std::mem::take(&mut self.refresh)
    }

    pub(crate) fn ask(&mut self, question: Question) -> Answer {
        let answer = self.prompt.ask(&question);
        debug!(question:% = question, answer:? = answer; "Asked user");
        answer
    }

    // ---------------------------------------------------------------------
    // Change feed
    // ---------------------------------------------------------------------

    pub fn is_frozen(&self) -> bool {
        self.frozen > 0
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen += 1;
    }

    /// Leaves one batch level; the outermost exit flushes deferred work.
    pub(crate) fn thaw(&mut self) {
        self.frozen = self.frozen.saturating_sub(1);
        if self.frozen > 0 {
            return;
        }
        self.pump();
        for tree in self.trees.values_mut() {
            tree.flush(&self.store);
        }
        self.refresh.extend(self.pending_refresh.drain(..));
        trace!("Batch flushed");
    }

    /// Delivers pending changes to the synchronizer, the layer trees and the
    /// refresh queue until the store is quiet.
    ///
    /// The synchronizer may react with further changes, which are delivered
    /// in the next round.
    pub(crate) fn pump(&mut self) {
        while self.store.has_changes() {
            let changes = self.store.take_changes();
            for change in &changes {
                self.sync.on_change(&mut self.store, change);
            }
            for change in &changes {
                self.dispatch(change);
            }
        }
    }

    fn dispatch(&mut self, change: &Change) {
        let frozen = self.is_frozen();
        match *change {
            Change::DiagramAdded(diagram) => {
                let mut tree = LayerTree::new(diagram);
                if !frozen {
                    tree.flush(&self.store);
                }
                self.trees.insert(diagram, tree);
            }
            Change::DiagramRemoved(diagram) => {
                self.trees.shift_remove(&diagram);
            }
            _ => {}
        }
        match change.diagram() {
            Some(diagram) => {
                let replaying = self.sync.is_suspended();
                if let Some(tree) = self.trees.get_mut(&diagram) {
                    if replaying {
                        tree.invalidate();
                    }
                    tree.on_change(&self.store, change, frozen);
                }
            }
            None => {
                for tree in self.trees.values_mut() {
                    tree.on_change(&self.store, change, frozen);
                }
            }
        }
        let request = change.refresh_request();
        if frozen {
            self.pending_refresh.insert(request);
        } else {
            self.refresh.push(request);
        }
    }

    // ---------------------------------------------------------------------
    // Undo and redo
    // ---------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.store.undo_log_ref().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.undo_log_ref().can_redo()
    }

    /// Labels of the undo stack, newest first.
    pub fn undo_labels(&self) -> Vec<String> {
        self.store.undo_log_ref().undo_labels().map(str::to_string).collect()
    }

    pub fn redo_labels(&self) -> Vec<String> {
        self.store.undo_log_ref().redo_labels().map(str::to_string).collect()
    }

    /// Reverts the newest undo entry.
    ///
    /// Returns `false` if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::InvalidOperation`] inside a transaction.
    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_idle("undo")?;
        let Some(entry) = self.store.undo_log().pop_undo() else {
            self.set_status("Nothing to undo");
            return Ok(false);
        };
        let label = entry.label().to_string();
        info!(label = label.as_str(); "Undo");
        let inverse = self.replay(entry.into_records());
        self.store.undo_log().push_redo(Entry::new(label.clone(), inverse));
        self.set_status(format!("Undo {label}"));
        Ok(true)
    }

    /// Re-applies the newest undone entry.
    ///
    /// Returns `false` if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::InvalidOperation`] inside a transaction.
    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_idle("redo")?;
        let Some(entry) = self.store.undo_log().pop_redo() else {
            self.set_status("Nothing to redo");
            return Ok(false);
        };
        let label = entry.label().to_string();
        info!(label = label.as_str(); "Redo");
        let inverse = self.replay(entry.into_records());
        self.store.undo_log().push_undo(Entry::new(label.clone(), inverse));
        self.set_status(format!("Redo {label}"));
        Ok(true)
    }

    fn ensure_idle(&self, action: &str) -> Result<()> {
        if self.store.undo_log_ref().depth() > 0 {
            return Err(SchemataError::invalid(format!(
                "cannot {action} while a transaction is open"
            )));
        }
        Ok(())
    }

    /// Reverts `records` back to front with the synchronizer suspended and
    /// returns their inverses in application order. Touched layer trees are
    /// rebuilt when the replay thaws.
    pub(crate) fn replay(&mut self, records: Vec<Record>) -> Vec<Record> {
        self.freeze();
        self.sync.suspend();
        let inverse = records
            .into_iter()
            .rev()
            .map(|record| self.store.revert(record))
            .collect();
        self.pump();
        self.sync.resume();
        self.thaw();
        inverse
    }
}
