//! Schemata - catalog-to-diagram synchronization for relational schema modeling.
//!
//! A [`Workspace`] holds models (catalogs of schemas, tables, views, routines
//! and foreign keys) and diagrams that depict them with figures, layers and
//! connections. Every edit goes through one undoable transaction; listeners
//! on the change feed keep connections in step with foreign keys and keep a
//! per-diagram layer tree in step with the diagram.
//!
//! # Examples
//!
//! ```
//! use schemata::{Workspace, config::AppConfig};
//! use schemata::placement::{PlaceOptions, Subject};
//! use schemata::geometry::Point;
//! use schemata::kind::FigureKind;
//!
//! let mut ws = Workspace::new(AppConfig::default());
//! let model = ws.create_model("shop").unwrap();
//! let diagram = ws.create_diagram(model, "main").unwrap();
//! let placed = ws
//!     .place(
//!         diagram,
//!         Point::new(40.0, 40.0),
//!         Subject::Kind(FigureKind::Table),
//!         PlaceOptions::named("orders"),
//!     )
//!     .unwrap();
//! assert!(placed.figure().is_some());
//! assert!(ws.undo().unwrap());
//! ```

pub mod canvas;
pub mod change;
pub mod clipboard;
pub mod config;
pub mod deletion;
pub mod layer_tree;
pub mod naming;
pub mod placement;
pub mod prompt;
pub mod registry;
pub mod store;
pub mod sync;

mod editing;
mod error;
mod layout;
mod transaction;
mod undo;
mod workspace;

pub use schemata_core::{catalog, color, diagram, geometry, identifier, kind};

pub use error::{Result, SchemataError};
pub use transaction::{Batch, Transaction};
pub use workspace::{Workspace, WorkspaceBuilder};
