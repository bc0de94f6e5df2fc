//! Stable kind tags for catalog objects and figures.
//!
//! Kind tags replace runtime type inspection: code that needs per-kind
//! behavior looks the tag up in a registry instead of matching on concrete
//! entity types throughout the code base.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Schema,
    Table,
    View,
    RoutineGroup,
    Routine,
    ForeignKey,
}

/// Scope within which sibling names must be unique.
///
/// Tables and views share a namespace because both name relations in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Schemas,
    Relations,
    RoutineGroups,
    Routines,
    ForeignKeys,
}

impl ObjectKind {
    /// Returns the sibling namespace this kind's names live in.
    pub fn namespace(self) -> Namespace {
        match self {
            Self::Schema => Namespace::Schemas,
            Self::Table | Self::View => Namespace::Relations,
            Self::RoutineGroup => Namespace::RoutineGroups,
            Self::Routine => Namespace::Routines,
            Self::ForeignKey => Namespace::ForeignKeys,
        }
    }

    /// Returns a human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Table => "table",
            Self::View => "view",
            Self::RoutineGroup => "routine group",
            Self::Routine => "routine",
            Self::ForeignKey => "foreign key",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of element a placement tool produces.
///
/// Bound kinds (`Table`, `View`, `RoutineGroup`) create or show a catalog
/// object; `Note` and `Image` are free-standing; `Layer` produces a layer.
/// The remaining variants name catalog kinds that have no visual form and
/// are rejected by placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureKind {
    Table,
    View,
    RoutineGroup,
    Note,
    Image,
    Layer,
    Routine,
    ForeignKey,
    Schema,
}

impl FigureKind {
    /// Returns the figure kind used to show an object of `kind`.
    pub fn for_object(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Schema => Self::Schema,
            ObjectKind::Table => Self::Table,
            ObjectKind::View => Self::View,
            ObjectKind::RoutineGroup => Self::RoutineGroup,
            ObjectKind::Routine => Self::Routine,
            ObjectKind::ForeignKey => Self::ForeignKey,
        }
    }

    /// Returns the catalog kind a figure of this kind is bound to, if any.
    pub fn object_kind(self) -> Option<ObjectKind> {
        match self {
            Self::Table => Some(ObjectKind::Table),
            Self::View => Some(ObjectKind::View),
            Self::RoutineGroup => Some(ObjectKind::RoutineGroup),
            Self::Routine => Some(ObjectKind::Routine),
            Self::ForeignKey => Some(ObjectKind::ForeignKey),
            Self::Schema => Some(ObjectKind::Schema),
            Self::Note | Self::Image | Self::Layer => None,
        }
    }

    /// Returns a human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::View => "view",
            Self::RoutineGroup => "routine group",
            Self::Note => "note",
            Self::Image => "image",
            Self::Layer => "layer",
            Self::Routine => "routine",
            Self::ForeignKey => "foreign key",
            Self::Schema => "schema",
        }
    }
}

impl fmt::Display for FigureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
