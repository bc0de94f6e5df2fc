//! Schemata Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Schemata
//! modeling engine. It includes:
//!
//! - **Identifiers**: Stable typed arena ids ([`identifier`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, sizes and rectangles ([`geometry`] module)
//! - **Kinds**: Kind tags for catalog objects and figures ([`kind`] module)
//! - **Catalog**: Models, schemas, tables, views, routines and foreign keys ([`catalog`] module)
//! - **Diagram**: Diagrams, layers, figures and connections ([`diagram`] module)

pub mod catalog;
pub mod color;
pub mod diagram;
pub mod geometry;
pub mod identifier;
pub mod kind;
