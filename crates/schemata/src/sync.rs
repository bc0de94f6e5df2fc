//! Relationship synchronizer.
//!
//! Connections are never created or removed by the services directly. They
//! are derived from foreign key state and figure presence: for every pair of
//! a diagram and a foreign key, a connection exists exactly when the key is
//! fully resolved and both the owning and the referenced table have a figure
//! in that diagram.
//!
//! The synchronizer listens to the change feed and reconciles only the pairs
//! a change can affect. While an undo or redo replays recorded images it is
//! suspended, because the replayed images already contain its effects.

use log::{debug, trace};

use schemata_core::{
    diagram::{Connection, Diagram, Element},
    identifier::{ConnectionId, DiagramId, FigureId, ObjectId},
    kind::ObjectKind,
};

use crate::{change::Change, store::Store};

/// Derives connections from foreign keys.
#[derive(Debug, Default)]
pub struct Synchronizer {
    suspended: usize,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops reacting to changes until the matching [`Self::resume`].
    pub(crate) fn suspend(&mut self) {
        self.suspended += 1;
    }

    pub(crate) fn resume(&mut self) {
        self.suspended = self.suspended.saturating_sub(1);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended > 0
    }

    /// Reacts to one change. Suppressed while suspended.
    pub(crate) fn on_change(&mut self, store: &mut Store, change: &Change) {
        if self.is_suspended() {
            trace!(change:?; "Synchronizer suspended, change ignored");
            return;
        }
        match *change {
            Change::ObjectAdded {
                object,
                kind: ObjectKind::ForeignKey,
            }
            | Change::ObjectChanged {
                object,
                kind: ObjectKind::ForeignKey,
            } => reconcile_key(store, object),
            Change::ObjectRemoved {
                object,
                kind: ObjectKind::ForeignKey,
                model,
            } => {
                let diagrams = store.model(model).map(|m| m.diagrams.clone()).unwrap_or_default();
                for diagram in diagrams {
                    for connection in store.connections_for(diagram, object) {
                        remove_connection(store, connection);
                    }
                }
            }
            Change::ObjectAdded {
                object,
                kind: ObjectKind::Table,
            }
            | Change::ObjectChanged {
                object,
                kind: ObjectKind::Table,
            }
            | Change::ObjectRemoved {
                object,
                kind: ObjectKind::Table,
                ..
            } => {
                for fk in store.foreign_keys_touching(object) {
                    reconcile_key(store, fk);
                }
            }
            Change::FigureAdded {
                diagram,
                object: Some(object),
                ..
            } => {
                for fk in store.foreign_keys_touching(object) {
                    reconcile(store, diagram, fk);
                }
            }
            Change::FigureRemoved {
                diagram,
                figure,
                object,
            } => {
                for connection in store.connections_at(figure) {
                    remove_connection(store, connection);
                }
                if let Some(object) = object {
                    for fk in store.foreign_keys_touching(object) {
                        reconcile(store, diagram, fk);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Returns `true` if `foreign_key` is fully resolved.
///
/// A key is resolved when its referenced table exists in the same model,
/// it maps at least one column, and every local and referenced column
/// exists on the owning and referenced table respectively.
pub fn is_resolved(store: &Store, foreign_key: ObjectId) -> bool {
    let Some(object) = store.object(foreign_key) else {
        return false;
    };
    let Some(fk) = object.as_foreign_key() else {
        return false;
    };
    let owner = object
        .parent
        .and_then(|id| store.object(id))
        .and_then(|o| o.as_table());
    let target_object = fk.target.and_then(|id| store.object(id));
    let (Some(owner), Some(target_object)) = (owner, target_object) else {
        return false;
    };
    let Some(target) = target_object.as_table() else {
        return false;
    };
    target_object.model == object.model
        && !fk.columns.is_empty()
        && fk
            .columns
            .iter()
            .all(|pair| owner.has_column(&pair.local) && target.has_column(&pair.referenced))
}

/// Reconciles `foreign_key` in every diagram of its model.
fn reconcile_key(store: &mut Store, foreign_key: ObjectId) {
    let Some(model) = store.model_of(foreign_key) else {
        return;
    };
    let diagrams = store.model(model).map(|m| m.diagrams.clone()).unwrap_or_default();
    for diagram in diagrams {
        reconcile(store, diagram, foreign_key);
    }
}

/// Brings the connections of one `(diagram, foreign_key)` pair in line with
/// the key's state.
///
/// An existing connection is kept and its end figure updated in place while
/// the key resolves; it is removed once resolution fails. Surplus
/// connections for the pair are removed.
pub(crate) fn reconcile(store: &mut Store, diagram: DiagramId, foreign_key: ObjectId) {
    let desired = endpoints(store, diagram, foreign_key);
    let existing = store.connections_for(diagram, foreign_key);

    let Some((start, end)) = desired else {
        for connection in existing {
            remove_connection(store, connection);
        }
        return;
    };

    match existing.split_first() {
        Some((&keep, surplus)) => {
            for &connection in surplus {
                debug!(connection:% = connection; "Removing surplus connection");
                remove_connection(store, connection);
            }
            store.update::<Connection, _>(keep, |connection| {
                connection.start = start;
                connection.end = end;
            });
        }
        None => {
            let id = store.ids().connection();
            debug!(connection:% = id, foreign_key:% = foreign_key, diagram:% = diagram; "Creating connection");
            store.insert(
                id,
                Connection {
                    id,
                    diagram,
                    foreign_key,
                    start,
                    end,
                },
            );
            store.update::<Diagram, _>(diagram, |d| d.connections.push(id));
        }
    }
}

fn endpoints(store: &Store, diagram: DiagramId, foreign_key: ObjectId) -> Option<(FigureId, FigureId)> {
    if !is_resolved(store, foreign_key) {
        return None;
    }
    let object = store.object(foreign_key)?;
    let diagram_model = store.diagram(diagram)?.model;
    if diagram_model != object.model {
        return None;
    }
    let target = object.as_foreign_key()?.target?;
    let start = store.figure_for(diagram, object.parent?)?;
    let end = store.figure_for(diagram, target)?;
    Some((start, end))
}

pub(crate) fn remove_connection(store: &mut Store, connection: ConnectionId) {
    let Some(removed) = store.remove::<Connection>(connection) else {
        return;
    };
    debug!(connection:% = connection, foreign_key:% = removed.foreign_key; "Removed connection");
    store.update::<Diagram, _>(removed.diagram, |d| {
        d.connections.retain(|id| *id != connection);
        d.selection.retain(|element| *element != Element::Connection(connection));
    });
}
