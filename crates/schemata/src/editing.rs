//! Catalog editing operations.
//!
//! These are the paths by which catalog content enters a workspace outside
//! of placement: creating models, diagrams and catalog objects, adding
//! columns and indexes, and wiring foreign keys. The synchronizer reacts to
//! the notifications they emit like to any other change.

use log::info;

use schemata_core::{
    catalog::{
        CatalogObject, Column, ColumnPair, ForeignKey, Index, Model, ObjectBody, Routine,
        RoutineGroup, Schema, Table, View,
    },
    diagram::{Diagram, Layer},
    identifier::{DiagramId, ModelId, ObjectId},
    kind::ObjectKind,
};

use crate::{
    error::{Result, SchemataError},
    naming::unique_name,
    workspace::Workspace,
};

impl Workspace {
    /// Creates an empty model.
    pub fn create_model(&mut self, name: &str) -> Result<ModelId> {
        self.run_transaction("Create model", |ws| {
            let id = ws.store.ids().model();
            ws.store.insert(id, Model::new(id, name));
            info!(model:% = id; "Created model");
            ws.set_status(format!("Created model {name}"));
            Ok(id)
        })
    }

    pub fn rename_model(&mut self, model: ModelId, name: &str) -> Result<()> {
        self.run_transaction("Rename model", |ws| {
            ws.store
                .update::<Model, _>(model, |m| m.name = name.to_string())
                .ok_or_else(|| SchemataError::not_found(model))?;
            ws.set_status(format!("Renamed model to {name}"));
            Ok(())
        })
    }

    /// Creates a diagram with its root layer.
    pub fn create_diagram(&mut self, model: ModelId, name: &str) -> Result<DiagramId> {
        self.run_transaction("Create diagram", |ws| {
            ws.require_model(model)?;
            let id = ws.store.ids().diagram();
            let root = ws.store.ids().layer();
            ws.store.insert(root, Layer::root(root, id));
            ws.store.insert(id, Diagram::new(id, model, name, root));
            ws.store.update::<Model, _>(model, |m| m.diagrams.push(id));
            info!(diagram:% = id, model:% = model; "Created diagram");
            ws.set_status(format!("Created diagram {name}"));
            Ok(id)
        })
    }

    /// Creates a schema. A taken name gets a numeric suffix.
    pub fn create_schema(&mut self, model: ModelId, name: &str) -> Result<ObjectId> {
        self.run_transaction("Create schema", |ws| {
            ws.require_model(model)?;
            let id = ws.insert_object(model, None, name, ObjectBody::Schema(Schema::default()))?;
            ws.status_created(id);
            Ok(id)
        })
    }

    pub fn create_table(&mut self, schema: ObjectId, name: &str, columns: Vec<Column>) -> Result<ObjectId> {
        self.run_transaction("Create table", |ws| {
            let model = ws.require_kind(schema, ObjectKind::Schema)?;
            let body = ObjectBody::Table(Table::with_columns(columns));
            let id = ws.insert_object(model, Some(schema), name, body)?;
            ws.status_created(id);
            Ok(id)
        })
    }

    pub fn create_view(&mut self, schema: ObjectId, name: &str, query: &str) -> Result<ObjectId> {
        self.run_transaction("Create view", |ws| {
            let model = ws.require_kind(schema, ObjectKind::Schema)?;
            let body = ObjectBody::View(View {
                query: query.to_string(),
            });
            let id = ws.insert_object(model, Some(schema), name, body)?;
            ws.status_created(id);
            Ok(id)
        })
    }

    pub fn create_routine(
        &mut self,
        schema: ObjectId,
        name: &str,
        language: &str,
        body: &str,
    ) -> Result<ObjectId> {
        self.run_transaction("Create routine", |ws| {
            let model = ws.require_kind(schema, ObjectKind::Schema)?;
            let body = ObjectBody::Routine(Routine {
                language: language.to_string(),
                body: body.to_string(),
            });
            let id = ws.insert_object(model, Some(schema), name, body)?;
            ws.status_created(id);
            Ok(id)
        })
    }

    pub fn create_routine_group(&mut self, schema: ObjectId, name: &str) -> Result<ObjectId> {
        self.run_transaction("Create routine group", |ws| {
            let model = ws.require_kind(schema, ObjectKind::Schema)?;
            let body = ObjectBody::RoutineGroup(RoutineGroup::default());
            let id = ws.insert_object(model, Some(schema), name, body)?;
            ws.status_created(id);
            Ok(id)
        })
    }

    /// Adds `routine` to `group`. A routine may belong to several groups.
    pub fn add_routine_to_group(&mut self, group: ObjectId, routine: ObjectId) -> Result<()> {
        self.run_transaction("Add routine to group", |ws| {
            let group_model = ws.require_kind(group, ObjectKind::RoutineGroup)?;
            let routine_model = ws.require_kind(routine, ObjectKind::Routine)?;
            if group_model != routine_model {
                return Err(SchemataError::invalid("routine and group belong to different models"));
            }
            ws.store.update::<CatalogObject, _>(group, |o| {
                if let Some(g) = o.as_routine_group_mut() {
                    if !g.routines.contains(&routine) {
                        g.routines.push(routine);
                    }
                }
            });
            ws.set_status(format!(
                "Added {} to {}",
                ws.object_name(routine),
                ws.object_name(group)
            ));
            Ok(())
        })
    }

    pub fn add_column(&mut self, table: ObjectId, column: Column) -> Result<()> {
        self.run_transaction("Add column", |ws| {
            ws.require_kind(table, ObjectKind::Table)?;
            let name = column.name.clone();
            let added = ws
                .store
                .update::<CatalogObject, _>(table, |o| match o.as_table_mut() {
                    Some(t) if !t.has_column(&column.name) => {
                        t.columns.push(column);
                        true
                    }
                    _ => false,
                })
                .unwrap_or(false);
            if !added {
                return Err(SchemataError::invalid(format!(
                    "column {name} already exists on {}",
                    ws.object_name(table)
                )));
            }
            ws.set_status(format!("Added column {}.{name}", ws.object_name(table)));
            Ok(())
        })
    }

    pub fn add_index(&mut self, table: ObjectId, name: &str, columns: Vec<String>) -> Result<()> {
        self.run_transaction("Add index", |ws| {
            ws.require_kind(table, ObjectKind::Table)?;
            let name = ws.push_index(table, name, columns, None);
            ws.set_status(format!("Added index {name}"));
            Ok(())
        })
    }

    /// Creates a foreign key on `table` together with its backing index.
    ///
    /// The key does not need to resolve; an unresolved key simply has no
    /// connection.
    pub fn create_foreign_key(
        &mut self,
        table: ObjectId,
        name: &str,
        target: Option<ObjectId>,
        columns: Vec<ColumnPair>,
    ) -> Result<ObjectId> {
        self.run_transaction("Create foreign key", |ws| {
            let model = ws.require_kind(table, ObjectKind::Table)?;
            let locals: Vec<String> = columns.iter().map(|pair| pair.local.clone()).collect();
            let body = ObjectBody::ForeignKey(ForeignKey::new(target, columns));
            let id = ws.insert_object(model, Some(table), name, body)?;
            let fk_name = ws.object_name(id);
            ws.push_index(table, &format!("{fk_name}_idx"), locals, Some(id));
            ws.status_created(id);
            Ok(id)
        })
    }

    /// Points a foreign key at another table, or at nothing.
    pub fn set_foreign_key_target(&mut self, foreign_key: ObjectId, target: Option<ObjectId>) -> Result<()> {
        self.run_transaction("Change foreign key", |ws| {
            ws.require_kind(foreign_key, ObjectKind::ForeignKey)?;
            ws.store.update::<CatalogObject, _>(foreign_key, |o| {
                if let Some(fk) = o.as_foreign_key_mut() {
                    fk.target = target;
                }
            });
            let target_name = target.map(|t| ws.object_name(t)).unwrap_or_else(|| "nothing".to_string());
            ws.set_status(format!("{} now references {target_name}", ws.object_name(foreign_key)));
            Ok(())
        })
    }

    /// Replaces the column mapping of a foreign key.
    pub fn set_foreign_key_columns(&mut self, foreign_key: ObjectId, columns: Vec<ColumnPair>) -> Result<()> {
        self.run_transaction("Change foreign key", |ws| {
            ws.require_kind(foreign_key, ObjectKind::ForeignKey)?;
            ws.store.update::<CatalogObject, _>(foreign_key, |o| {
                if let Some(fk) = o.as_foreign_key_mut() {
                    fk.columns = columns;
                }
            });
            ws.set_status(format!("Updated columns of {}", ws.object_name(foreign_key)));
            Ok(())
        })
    }

    /// Renames a catalog object, keeping the previous name as `prior_name`.
    ///
    /// Returns the final name, which carries a numeric suffix if `name` is
    /// taken by a sibling.
    pub fn rename(&mut self, object: ObjectId, name: &str) -> Result<String> {
        self.run_transaction("Rename", |ws| {
            let current = ws.require_object(object)?;
            let (model, parent, kind, old) = (current.model, current.parent, current.kind(), current.name.clone());
            if old == name {
                ws.set_status(format!("{old} unchanged"));
                return Ok(old);
            }
            let taken = ws.store.sibling_names(model, parent, kind.namespace());
            let final_name = unique_name(name, &taken);
            ws.store
                .update::<CatalogObject, _>(object, |o| o.rename(final_name.clone()));
            info!(object:% = object, name = final_name.as_str(); "Renamed object");
            ws.set_status(format!("Renamed {old} to {final_name}"));
            Ok(final_name)
        })
    }

    // ---------------------------------------------------------------------
    // Helpers shared by the services. None of them opens a transaction.
    // ---------------------------------------------------------------------

    pub(crate) fn require_model(&self, model: ModelId) -> Result<&Model> {
        self.store.model(model).ok_or_else(|| SchemataError::not_found(model))
    }

    pub(crate) fn require_object(&self, object: ObjectId) -> Result<&CatalogObject> {
        self.store.object(object).ok_or_else(|| SchemataError::not_found(object))
    }

    pub(crate) fn require_diagram(&self, diagram: DiagramId) -> Result<&Diagram> {
        self.store.diagram(diagram).ok_or_else(|| SchemataError::not_found(diagram))
    }

    /// Checks that `object` exists with `kind` and returns its model.
    pub(crate) fn require_kind(&self, object: ObjectId, kind: ObjectKind) -> Result<ModelId> {
        let found = self.require_object(object)?;
        if found.kind() != kind {
            return Err(SchemataError::invalid(format!(
                "{} is a {}, expected a {kind}",
                found.name,
                found.kind()
            )));
        }
        Ok(found.model)
    }

    pub(crate) fn object_name(&self, object: ObjectId) -> String {
        self.store
            .object(object)
            .map(|o| o.name.clone())
            .unwrap_or_else(|| object.to_string())
    }

    fn status_created(&mut self, object: ObjectId) {
        if let Some(o) = self.store.object(object) {
            let message = format!("Created {} {}", o.kind(), o.name);
            self.set_status(message);
        }
    }

    /// Inserts a catalog object under `parent` (or as a schema of `model`),
    /// giving it a free name derived from `name`.
    pub(crate) fn insert_object(
        &mut self,
        model: ModelId,
        parent: Option<ObjectId>,
        name: &str,
        body: ObjectBody,
    ) -> Result<ObjectId> {
        let kind = body.kind();
        let parent_kind = parent
            .and_then(|p| self.store.object(p))
            .map(CatalogObject::kind);
        let parent_ok = match kind {
            ObjectKind::Schema => parent.is_none(),
            ObjectKind::ForeignKey => parent_kind == Some(ObjectKind::Table),
            _ => parent_kind == Some(ObjectKind::Schema),
        };
        if !parent_ok {
            return Err(SchemataError::invalid(format!("a {kind} cannot be created there")));
        }
        let taken = self.store.sibling_names(model, parent, kind.namespace());
        let name = unique_name(name, &taken);
        let id = self.store.ids().object();
        self.store
            .insert(id, CatalogObject::new(id, model, parent, name, body));
        self.attach(model, parent, id, kind);
        Ok(id)
    }

    /// Inserts an already built object (e.g. a clipboard copy) and links it
    /// to its parent.
    pub(crate) fn insert_prepared(&mut self, object: CatalogObject) {
        let (id, model, parent, kind) = (object.id, object.model, object.parent, object.kind());
        self.store.insert(id, object);
        self.attach(model, parent, id, kind);
    }

    fn attach(&mut self, model: ModelId, parent: Option<ObjectId>, id: ObjectId, kind: ObjectKind) {
        match parent {
            None => {
                self.store.update::<Model, _>(model, |m| m.schemas.push(id));
            }
            Some(parent) => {
                self.store.update::<CatalogObject, _>(parent, |p| match &mut p.body {
                    ObjectBody::Schema(schema) => schema.children.push(id),
                    ObjectBody::Table(table) if kind == ObjectKind::ForeignKey => {
                        table.foreign_keys.push(id)
                    }
                    _ => {}
                });
            }
        }
    }

    /// Appends an index to `table`, returning its (disambiguated) name.
    fn push_index(
        &mut self,
        table: ObjectId,
        name: &str,
        columns: Vec<String>,
        foreign_key: Option<ObjectId>,
    ) -> String {
        let taken: Vec<String> = self
            .store
            .object(table)
            .and_then(CatalogObject::as_table)
            .map(|t| t.indexes.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default();
        let name = unique_name(name, &taken);
        let index = Index {
            name: name.clone(),
            columns,
            foreign_key,
        };
        self.store.update::<CatalogObject, _>(table, |o| {
            if let Some(t) = o.as_table_mut() {
                t.indexes.push(index);
            }
        });
        name
    }

    /// Returns the schema named `name` in `model`, creating it if missing.
    pub(crate) fn ensure_schema(&mut self, model: ModelId, name: &str) -> Result<ObjectId> {
        match self.store.find_child(model, None, name) {
            Some(id) => Ok(id),
            None => self.insert_object(model, None, name, ObjectBody::Schema(Schema::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace_with_schema() -> (Workspace, ModelId, ObjectId) {
        let mut ws = Workspace::default();
        let model = ws.create_model("shop").unwrap();
        let schema = ws.create_schema(model, "public").unwrap();
        (ws, model, schema)
    }

    #[test]
    fn test_create_table_disambiguates_within_namespace() {
        let (mut ws, _, schema) = workspace_with_schema();
        let first = ws.create_table(schema, "orders", vec![]).unwrap();
        let second = ws.create_table(schema, "orders", vec![]).unwrap();
        let view = ws.create_view(schema, "orders", "select 1").unwrap();

        assert_eq!(ws.store().object(first).unwrap().name, "orders");
        assert_eq!(ws.store().object(second).unwrap().name, "orders_1");
        // Views share the relation namespace with tables.
        assert_eq!(ws.store().object(view).unwrap().name, "orders_2");
        assert_eq!(ws.last_status(), Some("Created view orders_2"));
    }

    #[test]
    fn test_routine_groups_have_their_own_namespace() {
        let (mut ws, _, schema) = workspace_with_schema();
        ws.create_table(schema, "billing", vec![]).unwrap();
        let group = ws.create_routine_group(schema, "billing").unwrap();
        assert_eq!(ws.store().object(group).unwrap().name, "billing");
    }

    #[test]
    fn test_foreign_key_creates_backing_index() {
        let (mut ws, _, schema) = workspace_with_schema();
        let customers = ws
            .create_table(schema, "customers", vec![Column::new("id", "integer")])
            .unwrap();
        let orders = ws
            .create_table(schema, "orders", vec![Column::new("customer_id", "integer")])
            .unwrap();
        let fk = ws
            .create_foreign_key(
                orders,
                "fk_customer",
                Some(customers),
                vec![ColumnPair::new("customer_id", "id")],
            )
            .unwrap();

        let table = ws.store().object(orders).unwrap().as_table().unwrap();
        assert_eq!(table.foreign_keys, vec![fk]);
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].name, "fk_customer_idx");
        assert_eq!(table.indexes[0].foreign_key, Some(fk));
        assert_eq!(table.indexes[0].columns, vec!["customer_id".to_string()]);
    }

    #[test]
    fn test_foreign_key_requires_table_owner() {
        let (mut ws, _, schema) = workspace_with_schema();
        let view = ws.create_view(schema, "v", "select 1").unwrap();
        let err = ws.create_foreign_key(view, "fk", None, vec![]).unwrap_err();
        assert!(matches!(err, SchemataError::InvalidOperation(_)));
        assert!(ws.last_status().unwrap().starts_with("Create foreign key failed"));
    }

    #[test]
    fn test_rename_records_prior_name_and_disambiguates() {
        let (mut ws, _, schema) = workspace_with_schema();
        let a = ws.create_table(schema, "a", vec![]).unwrap();
        ws.create_table(schema, "b", vec![]).unwrap();

        let name = ws.rename(a, "b").unwrap();
        assert_eq!(name, "b_1");
        let object = ws.store().object(a).unwrap();
        assert_eq!(object.prior_name.as_deref(), Some("a"));
    }

    #[test]
    fn test_add_column_rejects_duplicates() {
        let (mut ws, _, schema) = workspace_with_schema();
        let t = ws
            .create_table(schema, "t", vec![Column::new("id", "integer")])
            .unwrap();
        ws.add_column(t, Column::new("name", "text")).unwrap();
        assert!(ws.add_column(t, Column::new("id", "integer")).is_err());
        let columns = &ws.store().object(t).unwrap().as_table().unwrap().columns;
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_add_routine_to_group_is_idempotent() {
        let (mut ws, _, schema) = workspace_with_schema();
        let group = ws.create_routine_group(schema, "billing").unwrap();
        let routine = ws.create_routine(schema, "charge", "plpgsql", "begin end").unwrap();
        ws.add_routine_to_group(group, routine).unwrap();
        ws.add_routine_to_group(group, routine).unwrap();
        let members = &ws.store().object(group).unwrap().as_routine_group().unwrap().routines;
        assert_eq!(members, &vec![routine]);
    }

    #[test]
    fn test_create_diagram_has_root_layer_and_tree() {
        let (mut ws, model, _) = workspace_with_schema();
        let diagram = ws.create_diagram(model, "main").unwrap();
        let d = ws.store().diagram(diagram).unwrap();
        assert!(ws.store().layer(d.root_layer).unwrap().is_root);
        assert_eq!(ws.store().model(model).unwrap().diagrams, vec![diagram]);
        assert!(ws.tree(diagram).unwrap().is_empty());
    }

    #[test]
    fn test_undo_create_table() {
        let (mut ws, _, schema) = workspace_with_schema();
        let t = ws.create_table(schema, "t", vec![]).unwrap();
        assert!(ws.undo().unwrap());
        assert!(ws.store().object(t).is_none());
        assert!(ws.store().object(schema).unwrap().children().is_empty());
        assert!(ws.redo().unwrap());
        assert_eq!(ws.store().object(schema).unwrap().children(), &[t]);
    }
}
