//! Arena of all entities of a workspace.
//!
//! Entities are addressed by the typed ids of [`schemata_core::identifier`];
//! back references between entities are plain ids. Every mutation goes
//! through [`Store::insert`], [`Store::update`] or [`Store::remove`], which
//! hand the entity's prior image to the undo log and queue the matching
//! [`Change`] notifications. Reads are free-form.

use std::{fmt, hash::Hash};

use indexmap::IndexMap;
use log::trace;

use schemata_core::{
    catalog::{CatalogObject, Model},
    diagram::{Connection, Diagram, Figure, Layer},
    identifier::{ConnectionId, DiagramId, FigureId, IdAllocator, LayerId, ModelId, ObjectId},
    kind::{Namespace, ObjectKind},
};

use crate::{
    change::Change,
    undo::{Record, UndoLog},
};

/// Structural and visual state of a workspace.
///
/// Equality ignores insertion order, so two arenas compare equal when they
/// hold the same entities with the same values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arena {
    models: IndexMap<ModelId, Model>,
    objects: IndexMap<ObjectId, CatalogObject>,
    diagrams: IndexMap<DiagramId, Diagram>,
    layers: IndexMap<LayerId, Layer>,
    figures: IndexMap<FigureId, Figure>,
    connections: IndexMap<ConnectionId, Connection>,
}

/// An entity kind stored in the [`Arena`].
pub(crate) trait Stored: Clone + PartialEq {
    type Id: Copy + Eq + Hash + fmt::Display;

    fn slot(arena: &Arena) -> &IndexMap<Self::Id, Self>;

    fn slot_mut(arena: &mut Arena) -> &mut IndexMap<Self::Id, Self>;

    fn record(id: Self::Id, image: Option<Self>) -> Record;

    /// Describes the transition from `before` to `after`.
    fn notify(id: Self::Id, before: Option<&Self>, after: Option<&Self>, changes: &mut Vec<Change>);
}

impl Stored for Model {
    type Id = ModelId;

    fn slot(arena: &Arena) -> &IndexMap<ModelId, Self> {
        &arena.models
    }

    fn slot_mut(arena: &mut Arena) -> &mut IndexMap<ModelId, Self> {
        &mut arena.models
    }

    fn record(id: ModelId, image: Option<Self>) -> Record {
        Record::Model(id, image)
    }

    fn notify(id: ModelId, before: Option<&Self>, after: Option<&Self>, changes: &mut Vec<Change>) {
        match (before, after) {
            (None, Some(_)) => changes.push(Change::ModelAdded(id)),
            (Some(_), None) => changes.push(Change::ModelRemoved(id)),
            (Some(_), Some(_)) => changes.push(Change::ModelChanged(id)),
            (None, None) => {}
        }
    }
}

impl Stored for CatalogObject {
    type Id = ObjectId;

    fn slot(arena: &Arena) -> &IndexMap<ObjectId, Self> {
        &arena.objects
    }

    fn slot_mut(arena: &mut Arena) -> &mut IndexMap<ObjectId, Self> {
        &mut arena.objects
    }

    fn record(id: ObjectId, image: Option<Self>) -> Record {
        Record::Object(id, image)
    }

    fn notify(id: ObjectId, before: Option<&Self>, after: Option<&Self>, changes: &mut Vec<Change>) {
        match (before, after) {
            (None, Some(object)) => changes.push(Change::ObjectAdded {
                object: id,
                kind: object.kind(),
            }),
            (Some(object), None) => changes.push(Change::ObjectRemoved {
                object: id,
                kind: object.kind(),
                model: object.model,
            }),
            (Some(_), Some(object)) => changes.push(Change::ObjectChanged {
                object: id,
                kind: object.kind(),
            }),
            (None, None) => {}
        }
    }
}

impl Stored for Diagram {
    type Id = DiagramId;

    fn slot(arena: &Arena) -> &IndexMap<DiagramId, Self> {
        &arena.diagrams
    }

    fn slot_mut(arena: &mut Arena) -> &mut IndexMap<DiagramId, Self> {
        &mut arena.diagrams
    }

    fn record(id: DiagramId, image: Option<Self>) -> Record {
        Record::Diagram(id, image)
    }

    fn notify(id: DiagramId, before: Option<&Self>, after: Option<&Self>, changes: &mut Vec<Change>) {
        match (before, after) {
            (None, Some(_)) => changes.push(Change::DiagramAdded(id)),
            (Some(_), None) => changes.push(Change::DiagramRemoved(id)),
            (Some(_), Some(_)) => changes.push(Change::DiagramChanged(id)),
            (None, None) => {}
        }
    }
}

impl Stored for Layer {
    type Id = LayerId;

    fn slot(arena: &Arena) -> &IndexMap<LayerId, Self> {
        &arena.layers
    }

    fn slot_mut(arena: &mut Arena) -> &mut IndexMap<LayerId, Self> {
        &mut arena.layers
    }

    fn record(id: LayerId, image: Option<Self>) -> Record {
        Record::Layer(id, image)
    }

    fn notify(id: LayerId, before: Option<&Self>, after: Option<&Self>, changes: &mut Vec<Change>) {
        match (before, after) {
            (None, Some(layer)) => changes.push(Change::LayerAdded {
                diagram: layer.diagram,
                layer: id,
            }),
            (Some(layer), None) => changes.push(Change::LayerRemoved {
                diagram: layer.diagram,
                layer: id,
            }),
            (Some(_), Some(layer)) => changes.push(Change::LayerChanged {
                diagram: layer.diagram,
                layer: id,
            }),
            (None, None) => {}
        }
    }
}

impl Stored for Figure {
    type Id = FigureId;

    fn slot(arena: &Arena) -> &IndexMap<FigureId, Self> {
        &arena.figures
    }

    fn slot_mut(arena: &mut Arena) -> &mut IndexMap<FigureId, Self> {
        &mut arena.figures
    }

    fn record(id: FigureId, image: Option<Self>) -> Record {
        Record::Figure(id, image)
    }

    fn notify(id: FigureId, before: Option<&Self>, after: Option<&Self>, changes: &mut Vec<Change>) {
        match (before, after) {
            (None, Some(figure)) => changes.push(Change::FigureAdded {
                diagram: figure.diagram,
                figure: id,
                object: figure.object,
            }),
            (Some(figure), None) => changes.push(Change::FigureRemoved {
                diagram: figure.diagram,
                figure: id,
                object: figure.object,
            }),
            (Some(old), Some(new)) => {
                if old.layer != new.layer {
                    changes.push(Change::FigureRelayered {
                        diagram: new.diagram,
                        figure: id,
                        from: old.layer,
                        to: new.layer,
                    });
                }
                let relayered_only = Figure {
                    layer: new.layer,
                    ..old.clone()
                } == *new;
                if !relayered_only {
                    changes.push(Change::FigureChanged {
                        diagram: new.diagram,
                        figure: id,
                    });
                }
            }
            (None, None) => {}
        }
    }
}

impl Stored for Connection {
    type Id = ConnectionId;

    fn slot(arena: &Arena) -> &IndexMap<ConnectionId, Self> {
        &arena.connections
    }

    fn slot_mut(arena: &mut Arena) -> &mut IndexMap<ConnectionId, Self> {
        &mut arena.connections
    }

    fn record(id: ConnectionId, image: Option<Self>) -> Record {
        Record::Connection(id, image)
    }

    fn notify(
        id: ConnectionId,
        before: Option<&Self>,
        after: Option<&Self>,
        changes: &mut Vec<Change>,
    ) {
        match (before, after) {
            (None, Some(connection)) => changes.push(Change::ConnectionAdded {
                diagram: connection.diagram,
                connection: id,
            }),
            (Some(connection), None) => changes.push(Change::ConnectionRemoved {
                diagram: connection.diagram,
                connection: id,
            }),
            (Some(_), Some(connection)) => changes.push(Change::ConnectionChanged {
                diagram: connection.diagram,
                connection: id,
            }),
            (None, None) => {}
        }
    }
}

/// The entity arena together with id allocation, the undo log and the
/// queue of pending change notifications.
#[derive(Debug)]
pub struct Store {
    arena: Arena,
    ids: IdAllocator,
    undo: UndoLog,
    changes: Vec<Change>,
}

impl Store {
    pub(crate) fn new(undo_limit: usize) -> Self {
        Self {
            arena: Arena::default(),
            ids: IdAllocator::new(),
            undo: UndoLog::new(undo_limit),
            changes: Vec::new(),
        }
    }

    /// Returns the full entity state, e.g. for snapshot comparison.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) fn ids(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub(crate) fn undo_log(&mut self) -> &mut UndoLog {
        &mut self.undo
    }

    pub(crate) fn undo_log_ref(&self) -> &UndoLog {
        &self.undo
    }

    pub(crate) fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    pub(crate) fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub(crate) fn get<E: Stored>(&self, id: E::Id) -> Option<&E> {
        E::slot(&self.arena).get(&id)
    }

    /// Inserts or replaces an entity.
    pub(crate) fn insert<E: Stored>(&mut self, id: E::Id, value: E) {
        let after = value.clone();
        let before = E::slot_mut(&mut self.arena).insert(id, value);
        if before.as_ref() == Some(&after) {
            return;
        }
        trace!(id:% = id; "Store insert");
        E::notify(id, before.as_ref(), Some(&after), &mut self.changes);
        self.undo.record(E::record(id, before));
    }

    /// Applies `f` to an entity, recording it only if the value changed.
    ///
    /// Returns `None` if the entity does not exist.
    pub(crate) fn update<E: Stored, R>(&mut self, id: E::Id, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        let entity = E::slot_mut(&mut self.arena).get_mut(&id)?;
        let before = entity.clone();
        let result = f(entity);
        if *entity != before {
            let after = entity.clone();
            E::notify(id, Some(&before), Some(&after), &mut self.changes);
            self.undo.record(E::record(id, Some(before)));
        }
        Some(result)
    }

    /// Removes an entity, returning it.
    pub(crate) fn remove<E: Stored>(&mut self, id: E::Id) -> Option<E> {
        let before = E::slot_mut(&mut self.arena).shift_remove(&id)?;
        trace!(id:% = id; "Store remove");
        E::notify(id, Some(&before), None, &mut self.changes);
        self.undo.record(E::record(id, Some(before.clone())));
        Some(before)
    }

    /// Puts a prior image back and returns the opposite record.
    ///
    /// Reverting is not journaled; the caller owns the returned record.
    pub(crate) fn revert(&mut self, record: Record) -> Record {
        match record {
            Record::Model(id, image) => Record::Model(id, self.restore(id, image)),
            Record::Object(id, image) => Record::Object(id, self.restore(id, image)),
            Record::Diagram(id, image) => Record::Diagram(id, self.restore(id, image)),
            Record::Layer(id, image) => Record::Layer(id, self.restore(id, image)),
            Record::Figure(id, image) => Record::Figure(id, self.restore(id, image)),
            Record::Connection(id, image) => Record::Connection(id, self.restore(id, image)),
        }
    }

    fn restore<E: Stored>(&mut self, id: E::Id, image: Option<E>) -> Option<E> {
        let slot = E::slot_mut(&mut self.arena);
        let current = match image.clone() {
            Some(value) => slot.insert(id, value),
            None => slot.shift_remove(&id),
        };
        if current != image {
            E::notify(id, current.as_ref(), image.as_ref(), &mut self.changes);
        }
        current
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.arena.models.get(&id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&CatalogObject> {
        self.arena.objects.get(&id)
    }

    pub fn diagram(&self, id: DiagramId) -> Option<&Diagram> {
        self.arena.diagrams.get(&id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.arena.layers.get(&id)
    }

    pub fn figure(&self, id: FigureId) -> Option<&Figure> {
        self.arena.figures.get(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.arena.connections.get(&id)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.arena.models.values()
    }

    pub fn objects(&self) -> impl Iterator<Item = &CatalogObject> {
        self.arena.objects.values()
    }

    pub fn figures(&self) -> impl Iterator<Item = &Figure> {
        self.arena.figures.values()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.arena.connections.values()
    }

    /// Returns the figure showing `object` in `diagram`, if any.
    pub fn figure_for(&self, diagram: DiagramId, object: ObjectId) -> Option<FigureId> {
        self.diagram(diagram)?
            .figures
            .iter()
            .copied()
            .find(|id| self.figure(*id).is_some_and(|figure| figure.object == Some(object)))
    }

    /// Returns every figure bound to `object`, across all diagrams.
    pub fn figures_bound_to(&self, object: ObjectId) -> Vec<FigureId> {
        self.figures()
            .filter(|figure| figure.object == Some(object))
            .map(|figure| figure.id)
            .collect()
    }

    /// Returns the connections of `diagram` bound to `foreign_key`.
    pub fn connections_for(&self, diagram: DiagramId, foreign_key: ObjectId) -> Vec<ConnectionId> {
        self.diagram(diagram)
            .map(|d| {
                d.connections
                    .iter()
                    .copied()
                    .filter(|id| {
                        self.connection(*id)
                            .is_some_and(|connection| connection.foreign_key == foreign_key)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns connections starting or ending at `figure`.
    pub fn connections_at(&self, figure: FigureId) -> Vec<ConnectionId> {
        self.connections()
            .filter(|c| c.start == figure || c.end == figure)
            .map(|c| c.id)
            .collect()
    }

    /// Returns the model an object belongs to.
    pub fn model_of(&self, object: ObjectId) -> Option<ModelId> {
        self.object(object).map(|o| o.model)
    }

    /// Returns every foreign key of `model`.
    pub fn foreign_keys_of(&self, model: ModelId) -> Vec<ObjectId> {
        self.objects()
            .filter(|o| o.model == model && o.kind() == ObjectKind::ForeignKey)
            .map(|o| o.id)
            .collect()
    }

    /// Returns foreign keys owned by or referencing `table`.
    pub fn foreign_keys_touching(&self, table: ObjectId) -> Vec<ObjectId> {
        self.objects()
            .filter(|o| match o.as_foreign_key() {
                Some(fk) => o.parent == Some(table) || fk.target == Some(table),
                None => false,
            })
            .map(|o| o.id)
            .collect()
    }

    /// Returns foreign keys whose target is `table`, excluding its own.
    pub fn foreign_keys_referencing(&self, table: ObjectId) -> Vec<ObjectId> {
        self.objects()
            .filter(|o| {
                o.parent != Some(table) && o.as_foreign_key().is_some_and(|fk| fk.target == Some(table))
            })
            .map(|o| o.id)
            .collect()
    }

    /// Returns the ids of the objects sharing `namespace` under `parent`.
    ///
    /// A `None` parent means the schema list of `model`.
    pub fn siblings(&self, model: ModelId, parent: Option<ObjectId>, namespace: Namespace) -> Vec<ObjectId> {
        let ids: &[ObjectId] = match parent {
            Some(parent) => self.object(parent).map(CatalogObject::children).unwrap_or(&[]),
            None => self.model(model).map(|m| m.schemas.as_slice()).unwrap_or(&[]),
        };
        ids.iter()
            .copied()
            .filter(|id| self.object(*id).is_some_and(|o| o.kind().namespace() == namespace))
            .collect()
    }

    /// Returns the names of the siblings sharing `namespace` under `parent`.
    pub fn sibling_names(&self, model: ModelId, parent: Option<ObjectId>, namespace: Namespace) -> Vec<String> {
        self.siblings(model, parent, namespace)
            .into_iter()
            .filter_map(|id| self.object(id).map(|o| o.name.clone()))
            .collect()
    }

    /// Looks up a child of `parent` (or a schema of `model`) by name.
    pub fn find_child(&self, model: ModelId, parent: Option<ObjectId>, name: &str) -> Option<ObjectId> {
        let ids: &[ObjectId] = match parent {
            Some(parent) => self.object(parent).map(CatalogObject::children).unwrap_or(&[]),
            None => self.model(model).map(|m| m.schemas.as_slice()).unwrap_or(&[]),
        };
        ids.iter()
            .copied()
            .find(|id| self.object(*id).is_some_and(|o| o.name == name))
    }

    /// Returns the absolute bounds of a figure.
    pub fn figure_bounds(&self, figure: FigureId) -> Option<schemata_core::geometry::Bounds> {
        let figure = self.figure(figure)?;
        let origin = self.layer(figure.layer)?.origin();
        Some(figure.absolute_bounds(origin))
    }

    /// Returns a display label for a figure: bound object name or text.
    pub fn figure_label(&self, figure: FigureId) -> String {
        let Some(figure) = self.figure(figure) else {
            return String::new();
        };
        match figure.object.and_then(|id| self.object(id)) {
            Some(object) => object.name.clone(),
            None => figure
                .text
                .clone()
                .unwrap_or_else(|| figure.kind.name().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use schemata_core::catalog::{ObjectBody, Schema};

    use super::*;

    fn schema(store: &mut Store, model: ModelId, name: &str) -> ObjectId {
        let id = store.ids().object();
        store.insert(
            id,
            CatalogObject::new(id, model, None, name, ObjectBody::Schema(Schema::default())),
        );
        id
    }

    #[test]
    fn test_insert_update_remove_emit_changes() {
        let mut store = Store::new(10);
        let model = store.ids().model();
        store.insert(model, Model::new(model, "m"));
        let id = schema(&mut store, model, "public");

        store.update::<CatalogObject, _>(id, |o| o.rename("sales"));
        store.remove::<CatalogObject>(id);

        let changes = store.take_changes();
        assert_eq!(changes.len(), 4);
        assert_eq!(changes[0], Change::ModelAdded(model));
        assert!(matches!(changes[1], Change::ObjectAdded { kind: ObjectKind::Schema, .. }));
        assert!(matches!(changes[2], Change::ObjectChanged { .. }));
        assert!(matches!(changes[3], Change::ObjectRemoved { model: m, .. } if m == model));
        assert!(!store.has_changes());
    }

    #[test]
    fn test_unchanged_update_is_silent() {
        let mut store = Store::new(10);
        let model = store.ids().model();
        store.insert(model, Model::new(model, "m"));
        store.take_changes();

        store.undo_log().begin("noop");
        let result = store.update::<Model, _>(model, |m| m.name.len());
        assert_eq!(result, Some(1));
        assert!(store.take_changes().is_empty());
        assert_eq!(store.undo_log().commit(), None);
    }

    #[test]
    fn test_update_missing_returns_none() {
        let mut store = Store::new(10);
        let missing = ModelId::from_raw(42);
        assert_eq!(store.update::<Model, _>(missing, |_| ()), None);
        assert!(store.remove::<Model>(missing).is_none());
    }

    #[test]
    fn test_revert_restores_prior_image() {
        let mut store = Store::new(10);
        let model = store.ids().model();
        store.undo_log().begin("create");
        store.insert(model, Model::new(model, "m"));
        store.update::<Model, _>(model, |m| m.name = "renamed".to_string());
        let records = store.undo_log().cancel();
        assert_eq!(records.len(), 2);

        for record in records.into_iter().rev() {
            store.revert(record);
        }
        assert!(store.model(model).is_none());
    }

    #[test]
    fn test_arena_equality_ignores_order() {
        let mut a = Store::new(10);
        let mut b = Store::new(10);
        let m1 = ModelId::from_raw(1);
        let m2 = ModelId::from_raw(2);
        a.insert(m1, Model::new(m1, "one"));
        a.insert(m2, Model::new(m2, "two"));
        b.insert(m2, Model::new(m2, "two"));
        b.insert(m1, Model::new(m1, "one"));
        assert_eq!(a.arena(), b.arena());
    }

    #[test]
    fn test_sibling_queries() {
        let mut store = Store::new(10);
        let model = store.ids().model();
        let mut m = Model::new(model, "m");
        let public = schema(&mut store, model, "public");
        let sales = schema(&mut store, model, "sales");
        m.schemas = vec![public, sales];
        store.insert(model, m);

        assert_eq!(
            store.sibling_names(model, None, Namespace::Schemas),
            vec!["public".to_string(), "sales".to_string()]
        );
        assert_eq!(store.find_child(model, None, "sales"), Some(sales));
        assert_eq!(store.find_child(model, None, "missing"), None);
    }
}
