//! Catalog entities: the relational schema independent of any diagram.
//!
//! The catalog is a tree. A [`Model`] owns schemas, schemas own tables,
//! views, routine groups and routines, and tables own their foreign keys.
//! Every node of the tree is a [`CatalogObject`] carrying the shared fields
//! (identity, owner, name) and a kind-specific [`ObjectBody`].
//!
//! # Example
//!
//! ```
//! # use schemata_core::catalog::{CatalogObject, Column, ObjectBody, Table};
//! # use schemata_core::identifier::{ModelId, ObjectId};
//! # use schemata_core::kind::ObjectKind;
//! let table = Table::with_columns(vec![Column::new("id", "integer")]);
//! let object = CatalogObject::new(
//!     ObjectId::from_raw(2),
//!     ModelId::from_raw(1),
//!     None,
//!     "orders",
//!     ObjectBody::Table(table),
//! );
//! assert_eq!(object.kind(), ObjectKind::Table);
//! assert!(object.as_table().is_some_and(|t| t.has_column("id")));
//! ```

use crate::{
    identifier::{DiagramId, ModelId, ObjectId},
    kind::ObjectKind,
};

/// A model: one catalog plus the diagrams that visualize it.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    /// Top-level schemas of the catalog, in creation order.
    pub schemas: Vec<ObjectId>,
    pub diagrams: Vec<DiagramId>,
}

impl Model {
    pub fn new(id: ModelId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            schemas: Vec::new(),
            diagrams: Vec::new(),
        }
    }
}

/// A node of the catalog tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogObject {
    pub id: ObjectId,
    pub model: ModelId,
    /// Owning object; `None` for schemas, which are owned by the model.
    pub parent: Option<ObjectId>,
    pub name: String,
    /// Name before the most recent rename. Never carried over by copies.
    pub prior_name: Option<String>,
    pub comment: Option<String>,
    pub body: ObjectBody,
}

impl CatalogObject {
    pub fn new(
        id: ObjectId,
        model: ModelId,
        parent: Option<ObjectId>,
        name: impl Into<String>,
        body: ObjectBody,
    ) -> Self {
        Self {
            id,
            model,
            parent,
            name: name.into(),
            prior_name: None,
            comment: None,
            body,
        }
    }

    /// Returns the kind tag of this object.
    pub fn kind(&self) -> ObjectKind {
        self.body.kind()
    }

    /// Renames the object, remembering the previous name.
    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.prior_name = Some(std::mem::replace(&mut self.name, name));
        }
    }

    /// Returns a copy suitable for the clipboard.
    ///
    /// The copy keeps every field except `prior_name`, which describes the
    /// history of the original rather than the object itself.
    pub fn detached_copy(&self) -> Self {
        Self {
            prior_name: None,
            ..self.clone()
        }
    }

    /// Returns ids of the objects directly owned by this one.
    pub fn children(&self) -> &[ObjectId] {
        match &self.body {
            ObjectBody::Schema(schema) => &schema.children,
            ObjectBody::Table(table) => &table.foreign_keys,
            _ => &[],
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match &self.body {
            ObjectBody::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn as_schema_mut(&mut self) -> Option<&mut Schema> {
        match &mut self.body {
            ObjectBody::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match &self.body {
            ObjectBody::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match &mut self.body {
            ObjectBody::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_routine_group(&self) -> Option<&RoutineGroup> {
        match &self.body {
            ObjectBody::RoutineGroup(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_routine_group_mut(&mut self) -> Option<&mut RoutineGroup> {
        match &mut self.body {
            ObjectBody::RoutineGroup(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_foreign_key(&self) -> Option<&ForeignKey> {
        match &self.body {
            ObjectBody::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }

    pub fn as_foreign_key_mut(&mut self) -> Option<&mut ForeignKey> {
        match &mut self.body {
            ObjectBody::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }
}

/// Kind-specific payload of a [`CatalogObject`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBody {
    Schema(Schema),
    Table(Table),
    View(View),
    RoutineGroup(RoutineGroup),
    Routine(Routine),
    ForeignKey(ForeignKey),
}

impl ObjectBody {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Schema(_) => ObjectKind::Schema,
            Self::Table(_) => ObjectKind::Table,
            Self::View(_) => ObjectKind::View,
            Self::RoutineGroup(_) => ObjectKind::RoutineGroup,
            Self::Routine(_) => ObjectKind::Routine,
            Self::ForeignKey(_) => ObjectKind::ForeignKey,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Tables, views, routine groups and routines in creation order.
    pub children: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
        }
    }

    /// Marks the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    /// The foreign key this index was created for, if any.
    pub foreign_key: Option<ObjectId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    /// Foreign keys owned by this table, in creation order.
    pub foreign_keys: Vec<ObjectId>,
    pub engine: Option<String>,
}

impl Table {
    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutineGroup {
    /// Member routines. A routine may belong to several groups.
    pub routines: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routine {
    pub language: String,
    pub body: String,
}

/// One column mapping of a foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPair {
    /// Column of the owning table.
    pub local: String,
    /// Column of the referenced table.
    pub referenced: String,
}

impl ColumnPair {
    pub fn new(local: impl Into<String>, referenced: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            referenced: referenced.into(),
        }
    }
}

/// A foreign key. Its owning table is the parent of the catalog object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignKey {
    pub target: Option<ObjectId>,
    pub columns: Vec<ColumnPair>,
}

impl ForeignKey {
    pub fn new(target: Option<ObjectId>, columns: Vec<ColumnPair>) -> Self {
        Self { target, columns }
    }

    /// Returns the local column names in mapping order.
    pub fn local_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|pair| pair.local.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_object(name: &str) -> CatalogObject {
        CatalogObject::new(
            ObjectId::from_raw(10),
            ModelId::from_raw(1),
            Some(ObjectId::from_raw(2)),
            name,
            ObjectBody::Table(Table::with_columns(vec![
                Column::new("id", "integer").not_null(),
                Column::new("customer_id", "integer"),
            ])),
        )
    }

    #[test]
    fn test_rename_records_prior_name() {
        let mut object = table_object("orders");
        object.rename("purchase_orders");

        assert_eq!(object.name, "purchase_orders");
        assert_eq!(object.prior_name.as_deref(), Some("orders"));
    }

    #[test]
    fn test_rename_to_same_name_keeps_history() {
        let mut object = table_object("orders");
        object.rename("orders");
        assert_eq!(object.prior_name, None);
    }

    #[test]
    fn test_detached_copy_drops_prior_name() {
        let mut object = table_object("orders");
        object.rename("purchase_orders");
        object.comment = Some("sales".to_string());

        let copy = object.detached_copy();
        assert_eq!(copy.prior_name, None);
        assert_eq!(copy.name, "purchase_orders");
        assert_eq!(copy.comment.as_deref(), Some("sales"));
        assert_eq!(copy.body, object.body);
    }

    #[test]
    fn test_table_columns() {
        let object = table_object("orders");
        let table = object.as_table().unwrap();

        assert!(table.has_column("customer_id"));
        assert!(!table.has_column("missing"));
        assert!(!table.column("id").unwrap().nullable);
    }

    #[test]
    fn test_accessors_reject_other_kinds() {
        let object = table_object("orders");
        assert!(object.as_schema().is_none());
        assert!(object.as_foreign_key().is_none());
        assert!(object.as_routine_group().is_none());
    }

    #[test]
    fn test_foreign_key_local_columns() {
        let fk = ForeignKey::new(
            Some(ObjectId::from_raw(3)),
            vec![
                ColumnPair::new("customer_id", "id"),
                ColumnPair::new("region", "region"),
            ],
        );
        let locals: Vec<&str> = fk.local_columns().collect();
        assert_eq!(locals, vec!["customer_id", "region"]);
    }

    #[test]
    fn test_children() {
        let schema = CatalogObject::new(
            ObjectId::from_raw(2),
            ModelId::from_raw(1),
            None,
            "public",
            ObjectBody::Schema(Schema {
                children: vec![ObjectId::from_raw(10)],
            }),
        );
        assert_eq!(schema.children(), &[ObjectId::from_raw(10)]);
        assert!(
            CatalogObject::new(
                ObjectId::from_raw(5),
                ModelId::from_raw(1),
                None,
                "v",
                ObjectBody::View(View::default()),
            )
            .children()
            .is_empty()
        );
    }
}
