//! Cascading deletion.
//!
//! Deleting a catalog object removes it from the catalog tree and every
//! figure bound to it from every diagram of its model. Connections follow
//! through the synchronizer. "Figure only" deletion leaves the catalog
//! untouched, except for connections: a connection cannot outlive its
//! foreign key, so removing one removes the key.

use std::collections::HashSet;

use log::{debug, info};

use schemata_core::{
    catalog::{CatalogObject, Model, ObjectBody},
    diagram::{Diagram, Element, Figure, Layer},
    identifier::{ConnectionId, DiagramId, FigureId, LayerId, ObjectId},
    kind::ObjectKind,
};

use crate::{
    error::{Result, SchemataError},
    prompt::{Answer, Question},
    sync::remove_connection,
    workspace::Workspace,
};

/// Something that can be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Object(ObjectId),
    Figure(FigureId),
    Layer(LayerId),
    Connection(ConnectionId),
}

impl From<Element> for Target {
    fn from(element: Element) -> Self {
        match element {
            Element::Figure(id) => Self::Figure(id),
            Element::Layer(id) => Self::Layer(id),
            Element::Connection(id) => Self::Connection(id),
        }
    }
}

impl Workspace {
    /// Deletes `target`.
    ///
    /// With `figure_only` a figure is removed from its diagram while its
    /// object stays in the catalog. Returns `false` if the target no longer
    /// exists.
    ///
    /// # Errors
    ///
    /// - [`SchemataError::UserCancelled`] if a confirmation was cancelled;
    ///   nothing is changed.
    /// - [`SchemataError::InvalidOperation`] for the root layer.
    pub fn delete(&mut self, target: Target, figure_only: bool) -> Result<bool> {
        if !self.target_exists(target) {
            debug!(subject:? = target; "Delete target is gone");
            self.set_status("Nothing to delete");
            return Ok(false);
        }
        let description = self.describe(target);
        info!(subject:? = target, figure_only = figure_only; "Deleting");
        self.run_transaction("Delete", |ws| {
            ws.delete_target(target, figure_only, &mut HashSet::new())?;
            let verb = if figure_only && !matches!(target, Target::Connection(_)) {
                "Removed"
            } else {
                "Deleted"
            };
            ws.set_status(format!("{verb} {description}"));
            Ok(true)
        })
    }

    /// Deletes every selected element of `diagram` in one transaction and
    /// returns how many were deleted.
    pub fn delete_selection(&mut self, diagram: DiagramId, figure_only: bool) -> Result<usize> {
        let selection = self.require_diagram(diagram)?.selection.clone();
        self.run_transaction("Delete selection", |ws| {
            let deleted = ws.delete_elements(&selection, figure_only)?;
            ws.set_status(format!("Deleted {deleted} element(s)"));
            Ok(deleted)
        })
    }

    /// Deletes `elements`, skipping those an earlier cascade already removed.
    pub(crate) fn delete_elements(&mut self, elements: &[Element], figure_only: bool) -> Result<usize> {
        let mut visited = HashSet::new();
        let mut deleted = 0;
        for element in elements {
            let target = Target::from(*element);
            if self.target_exists(target) {
                self.delete_target(target, figure_only, &mut visited)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    fn target_exists(&self, target: Target) -> bool {
        match target {
            Target::Object(id) => self.store.object(id).is_some(),
            Target::Figure(id) => self.store.figure(id).is_some(),
            Target::Layer(id) => self.store.layer(id).is_some(),
            Target::Connection(id) => self.store.connection(id).is_some(),
        }
    }

    fn describe(&self, target: Target) -> String {
        match target {
            Target::Object(id) => self
                .store
                .object(id)
                .map(|o| format!("{} {}", o.kind(), o.name))
                .unwrap_or_else(|| id.to_string()),
            Target::Figure(id) => self.store.figure_label(id),
            Target::Layer(id) => format!("layer {}", self.layer_name(id)),
            Target::Connection(id) => self
                .store
                .connection(id)
                .map(|c| format!("foreign key {}", self.object_name(c.foreign_key)))
                .unwrap_or_else(|| id.to_string()),
        }
    }

    fn delete_target(&mut self, target: Target, figure_only: bool, visited: &mut HashSet<ObjectId>) -> Result<()> {
        match target {
            Target::Figure(figure) => {
                let bound = self.store.figure(figure).and_then(|f| f.object);
                match bound {
                    Some(object) if !figure_only => self.delete_object(object, visited)?,
                    _ => self.remove_figure(figure),
                }
            }
            Target::Object(object) => {
                if figure_only {
                    for figure in self.store.figures_bound_to(object) {
                        self.remove_figure(figure);
                    }
                } else {
                    self.delete_object(object, visited)?;
                }
            }
            Target::Layer(layer) => self.delete_layer(layer)?,
            Target::Connection(connection) => self.delete_connection(connection, visited)?,
        }
        self.pump();
        Ok(())
    }

    /// Removes a figure from its layer, diagram and selection.
    pub(crate) fn remove_figure(&mut self, figure: FigureId) {
        let Some(removed) = self.store.remove::<Figure>(figure) else {
            return;
        };
        self.store
            .update::<Layer, _>(removed.layer, |l| l.figures.retain(|id| *id != figure));
        self.store.update::<Diagram, _>(removed.diagram, |d| {
            d.figures.retain(|id| *id != figure);
            d.selection.retain(|element| *element != Element::Figure(figure));
        });
        debug!(figure:% = figure; "Removed figure");
    }

    /// Deletes a catalog object with everything that depends on it.
    fn delete_object(&mut self, object: ObjectId, visited: &mut HashSet<ObjectId>) -> Result<()> {
        if !visited.insert(object) {
            return Ok(());
        }
        let Some(original) = self.store.object(object).cloned() else {
            return Ok(());
        };
        match &original.body {
            ObjectBody::Schema(schema) => {
                for child in schema.children.clone() {
                    self.delete_object(child, visited)?;
                }
            }
            ObjectBody::Table(table) => {
                for fk in table.foreign_keys.clone() {
                    self.delete_object(fk, visited)?;
                }
                for fk in self.store.foreign_keys_referencing(object) {
                    self.delete_object(fk, visited)?;
                }
            }
            ObjectBody::RoutineGroup(group) => {
                let orphans = self.orphaned_routines(object, &group.routines);
                if !orphans.is_empty() {
                    let question = Question::DeleteOrphanRoutines {
                        group: original.name.clone(),
                        routines: orphans.iter().map(|r| self.object_name(*r)).collect(),
                    };
                    match self.ask(question) {
                        Answer::Yes => {
                            for routine in orphans {
                                self.delete_object(routine, visited)?;
                            }
                        }
                        Answer::No => {}
                        Answer::Cancel => return Err(SchemataError::UserCancelled),
                    }
                }
            }
            ObjectBody::Routine(_) => self.remove_from_groups(object),
            ObjectBody::View(_) | ObjectBody::ForeignKey(_) => {}
        }

        for figure in self.store.figures_bound_to(object) {
            self.remove_figure(figure);
        }
        self.detach(&original);
        self.store.remove::<CatalogObject>(object);
        debug!(object:% = object, kind:% = original.kind(); "Deleted object");
        Ok(())
    }

    /// Unlinks an object from its parent, dropping a foreign key's backing
    /// index with it.
    fn detach(&mut self, object: &CatalogObject) {
        let id = object.id;
        match object.parent {
            None => {
                self.store
                    .update::<Model, _>(object.model, |m| m.schemas.retain(|s| *s != id));
            }
            Some(parent) => {
                self.store.update::<CatalogObject, _>(parent, |p| match &mut p.body {
                    ObjectBody::Schema(schema) => schema.children.retain(|c| *c != id),
                    ObjectBody::Table(table) => {
                        table.foreign_keys.retain(|fk| *fk != id);
                        table.indexes.retain(|index| index.foreign_key != Some(id));
                    }
                    _ => {}
                });
            }
        }
    }

    /// Returns members of `group` that belong to no other routine group.
    fn orphaned_routines(&self, group: ObjectId, routines: &[ObjectId]) -> Vec<ObjectId> {
        routines
            .iter()
            .copied()
            .filter(|routine| self.store.object(*routine).is_some())
            .filter(|routine| {
                !self.store.objects().any(|o| {
                    o.id != group
                        && o.as_routine_group()
                            .is_some_and(|g| g.routines.contains(routine))
                })
            })
            .collect()
    }

    fn remove_from_groups(&mut self, routine: ObjectId) {
        let groups: Vec<ObjectId> = self
            .store
            .objects()
            .filter(|o| {
                o.as_routine_group()
                    .is_some_and(|g| g.routines.contains(&routine))
            })
            .map(|o| o.id)
            .collect();
        for group in groups {
            self.store.update::<CatalogObject, _>(group, |o| {
                if let Some(g) = o.as_routine_group_mut() {
                    g.routines.retain(|r| *r != routine);
                }
            });
        }
    }

    /// Deletes a layer; its figures move to the enclosing layer.
    fn delete_layer(&mut self, layer: LayerId) -> Result<()> {
        let Some(removed) = self.store.layer(layer).cloned() else {
            return Ok(());
        };
        if removed.is_root {
            return Err(SchemataError::invalid("the root layer cannot be deleted"));
        }
        let diagram = removed.diagram;
        let points: Vec<_> = removed
            .figures
            .iter()
            .filter_map(|f| self.store.figure_bounds(*f).map(|b| (*f, b.min_point())))
            .collect();
        self.store.update::<Diagram, _>(diagram, |d| {
            d.layers.retain(|l| *l != layer);
            d.selection.retain(|element| *element != Element::Layer(layer));
        });
        for (figure, point) in points {
            let target = self.innermost_layer(diagram, point)?;
            self.assign_layer(figure, target, point);
        }
        self.store.remove::<Layer>(layer);
        self.revalidate_layers(diagram);
        debug!(layer:% = layer; "Deleted layer");
        Ok(())
    }

    /// Removes the foreign key behind a connection, asking whether to drop
    /// its local columns unless other keys share them.
    fn delete_connection(&mut self, connection: ConnectionId, visited: &mut HashSet<ObjectId>) -> Result<()> {
        let Some(foreign_key) = self.store.connection(connection).map(|c| c.foreign_key) else {
            return Ok(());
        };
        let Some(fk_object) = self.store.object(foreign_key).cloned() else {
            remove_connection(&mut self.store, connection);
            return Ok(());
        };
        let columns: Vec<String> = fk_object
            .as_foreign_key()
            .map(|fk| fk.local_columns().map(str::to_string).collect())
            .unwrap_or_default();
        let table = fk_object.parent;
        let shared = table.is_some_and(|table| self.columns_shared(table, foreign_key, &columns));

        let mut drop_columns = false;
        if !columns.is_empty() && !shared {
            let question = Question::DropForeignKeyColumns {
                foreign_key: fk_object.name.clone(),
                columns: columns.clone(),
            };
            match self.ask(question) {
                Answer::Yes => drop_columns = true,
                Answer::No => {}
                Answer::Cancel => return Err(SchemataError::UserCancelled),
            }
        }

        self.delete_object(foreign_key, visited)?;
        if let Some(table) = table.filter(|_| drop_columns) {
            self.store.update::<CatalogObject, _>(table, |o| {
                if let Some(t) = o.as_table_mut() {
                    t.columns.retain(|c| !columns.contains(&c.name));
                    t.indexes.retain(|i| !i.columns.iter().any(|c| columns.contains(c)));
                }
            });
            info!(foreign_key:% = foreign_key; "Dropped foreign key columns");
        }
        Ok(())
    }

    /// Returns `true` if another foreign key of `table` uses any of
    /// `columns` locally.
    fn columns_shared(&self, table: ObjectId, foreign_key: ObjectId, columns: &[String]) -> bool {
        self.store
            .object(table)
            .and_then(CatalogObject::as_table)
            .map(|t| {
                t.foreign_keys
                    .iter()
                    .filter(|fk| **fk != foreign_key)
                    .filter_map(|fk| self.store.object(*fk))
                    .filter(|o| o.kind() == ObjectKind::ForeignKey)
                    .filter_map(CatalogObject::as_foreign_key)
                    .any(|fk| fk.local_columns().any(|c| columns.iter().any(|own| own == c)))
            })
            .unwrap_or(false)
    }
}
