//! Placement tools keyed by figure kind.
//!
//! Placement never inspects object types directly. It looks the requested
//! [`FigureKind`] up here and acts on the [`Instantiate`] variant of the
//! handler it finds; kinds without a handler cannot be placed.

use indexmap::IndexMap;

use schemata_core::kind::{FigureKind, ObjectKind};

use crate::error::{Result, SchemataError};

/// What placing a kind creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instantiate {
    /// A new catalog object of the given kind plus a figure bound to it.
    Object(ObjectKind),
    /// A free-standing figure with no catalog object (notes, images).
    Free,
    /// A new layer.
    Layer,
}

/// A registered placement tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindHandler {
    kind: FigureKind,
    instantiate: Instantiate,
    /// Human-readable tool name used in status messages.
    title: &'static str,
}

impl KindHandler {
    pub fn new(kind: FigureKind, instantiate: Instantiate, title: &'static str) -> Self {
        Self {
            kind,
            instantiate,
            title,
        }
    }

    pub fn kind(&self) -> FigureKind {
        self.kind
    }

    pub fn instantiate(&self) -> Instantiate {
        self.instantiate
    }

    pub fn title(&self) -> &'static str {
        self.title
    }
}

/// Registry of placement tools.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    handlers: IndexMap<FigureKind, KindHandler>,
}

impl Default for KindRegistry {
    /// Registers the tools of a schema modeler: tables, views, routine
    /// groups, notes, images and layers.
    fn default() -> Self {
        let mut registry = Self::empty();
        for handler in [
            KindHandler::new(FigureKind::Table, Instantiate::Object(ObjectKind::Table), "Table"),
            KindHandler::new(FigureKind::View, Instantiate::Object(ObjectKind::View), "View"),
            KindHandler::new(
                FigureKind::RoutineGroup,
                Instantiate::Object(ObjectKind::RoutineGroup),
                "Routine group",
            ),
            KindHandler::new(FigureKind::Note, Instantiate::Free, "Note"),
            KindHandler::new(FigureKind::Image, Instantiate::Free, "Image"),
            KindHandler::new(FigureKind::Layer, Instantiate::Layer, "Layer"),
        ] {
            registry.register(handler);
        }
        registry
    }
}

impl KindRegistry {
    /// Creates a registry without any tools.
    pub fn empty() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Registers or replaces the handler for its kind.
    pub fn register(&mut self, handler: KindHandler) -> Option<KindHandler> {
        self.handlers.insert(handler.kind, handler)
    }

    /// Disables the tool for `kind`.
    pub fn unregister(&mut self, kind: FigureKind) -> Option<KindHandler> {
        self.handlers.shift_remove(&kind)
    }

    /// Looks up the handler for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::InvalidKind`] if no tool is registered for
    /// `kind` or the kind has no visual form.
    pub fn handler(&self, kind: FigureKind) -> Result<&KindHandler> {
        self.handlers
            .get(&kind)
            .ok_or(SchemataError::InvalidKind(kind))
    }

    pub fn is_registered(&self, kind: FigureKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = FigureKind> + '_ {
        self.handlers.keys().copied()
    }
}
