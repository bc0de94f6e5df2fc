//! Change notifications and refresh requests.
//!
//! Every mutation of the store emits one or more [`Change`]s. The workspace
//! drains them after each step and hands them to the relationship
//! synchronizer, the layer trees and the refresh queue, which is how those
//! listeners react incrementally instead of recomputing from scratch.

use std::fmt;

use schemata_core::{
    identifier::{ConnectionId, DiagramId, FigureId, LayerId, ModelId, ObjectId},
    kind::ObjectKind,
};

/// A single structural change.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    ModelAdded(ModelId),
    ModelChanged(ModelId),
    ModelRemoved(ModelId),

    ObjectAdded {
        object: ObjectId,
        kind: ObjectKind,
    },
    ObjectChanged {
        object: ObjectId,
        kind: ObjectKind,
    },
    ObjectRemoved {
        object: ObjectId,
        kind: ObjectKind,
        model: ModelId,
    },

    DiagramAdded(DiagramId),
    /// Lists or selection of a diagram changed.
    DiagramChanged(DiagramId),
    DiagramRemoved(DiagramId),

    LayerAdded {
        diagram: DiagramId,
        layer: LayerId,
    },
    LayerChanged {
        diagram: DiagramId,
        layer: LayerId,
    },
    LayerRemoved {
        diagram: DiagramId,
        layer: LayerId,
    },

    FigureAdded {
        diagram: DiagramId,
        figure: FigureId,
        object: Option<ObjectId>,
    },
    /// Position, size, color or text of a figure changed.
    FigureChanged {
        diagram: DiagramId,
        figure: FigureId,
    },
    /// A figure was reassigned to another layer.
    FigureRelayered {
        diagram: DiagramId,
        figure: FigureId,
        from: LayerId,
        to: LayerId,
    },
    FigureRemoved {
        diagram: DiagramId,
        figure: FigureId,
        object: Option<ObjectId>,
    },

    ConnectionAdded {
        diagram: DiagramId,
        connection: ConnectionId,
    },
    ConnectionChanged {
        diagram: DiagramId,
        connection: ConnectionId,
    },
    ConnectionRemoved {
        diagram: DiagramId,
        connection: ConnectionId,
    },
}

impl Change {
    /// Returns the diagram the change belongs to, if it is a diagram change.
    pub fn diagram(&self) -> Option<DiagramId> {
        match self {
            Self::DiagramAdded(diagram)
            | Self::DiagramChanged(diagram)
            | Self::DiagramRemoved(diagram)
            | Self::LayerAdded { diagram, .. }
            | Self::LayerChanged { diagram, .. }
            | Self::LayerRemoved { diagram, .. }
            | Self::FigureAdded { diagram, .. }
            | Self::FigureChanged { diagram, .. }
            | Self::FigureRelayered { diagram, .. }
            | Self::FigureRemoved { diagram, .. }
            | Self::ConnectionAdded { diagram, .. }
            | Self::ConnectionChanged { diagram, .. }
            | Self::ConnectionRemoved { diagram, .. } => Some(*diagram),
            Self::ModelAdded(_)
            | Self::ModelChanged(_)
            | Self::ModelRemoved(_)
            | Self::ObjectAdded { .. }
            | Self::ObjectChanged { .. }
            | Self::ObjectRemoved { .. } => None,
        }
    }

    /// Returns the refresh request a UI should schedule for this change.
    pub fn refresh_request(&self) -> RefreshRequest {
        match *self {
            Self::ModelAdded(id) | Self::ModelChanged(id) | Self::ModelRemoved(id) => {
                RefreshRequest::new(RefreshKind::Model, id.raw())
            }
            Self::ObjectAdded { object, .. }
            | Self::ObjectChanged { object, .. }
            | Self::ObjectRemoved { object, .. } => {
                RefreshRequest::new(RefreshKind::Object, object.raw())
            }
            Self::DiagramAdded(id) | Self::DiagramChanged(id) | Self::DiagramRemoved(id) => {
                RefreshRequest::new(RefreshKind::Diagram, id.raw())
            }
            Self::LayerAdded { layer, .. }
            | Self::LayerChanged { layer, .. }
            | Self::LayerRemoved { layer, .. } => RefreshRequest::new(RefreshKind::Layer, layer.raw()),
            Self::FigureAdded { figure, .. }
            | Self::FigureChanged { figure, .. }
            | Self::FigureRelayered { figure, .. }
            | Self::FigureRemoved { figure, .. } => {
                RefreshRequest::new(RefreshKind::Figure, figure.raw())
            }
            Self::ConnectionAdded { connection, .. }
            | Self::ConnectionChanged { connection, .. }
            | Self::ConnectionRemoved { connection, .. } => {
                RefreshRequest::new(RefreshKind::Connection, connection.raw())
            }
        }
    }
}

/// What a refresh request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshKind {
    Model,
    Object,
    Diagram,
    Layer,
    Figure,
    Connection,
}

impl RefreshKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Object => "object",
            Self::Diagram => "diagram",
            Self::Layer => "layer",
            Self::Figure => "figure",
            Self::Connection => "connection",
        }
    }
}

/// "Refresh requested" event for UI refresh scheduling.
///
/// Requests are coalesced while a batch is open, so each `(kind, id)` pair
/// is reported at most once per outermost operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshRequest {
    kind: RefreshKind,
    id: u64,
}

impl RefreshRequest {
    pub fn new(kind: RefreshKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn kind(&self) -> RefreshKind {
        self.kind
    }

    /// Raw id of the entity to refresh.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.name(), self.id)
    }
}
