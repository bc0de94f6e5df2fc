//! Diagram entities: the visual side of a model.
//!
//! A [`Diagram`] is a canvas made of [`Layer`]s, [`Figure`]s and
//! [`Connection`]s. Layers are rectangles in absolute diagram coordinates;
//! every figure belongs to exactly one layer and stores its position as an
//! offset from that layer's top-left corner. Each diagram has a root layer
//! with unbounded extent that catches every figure not inside another layer.

use crate::{
    color::Color,
    geometry::{Bounds, Point, Size},
    identifier::{ConnectionId, DiagramId, FigureId, LayerId, ModelId, ObjectId},
    kind::FigureKind,
};

/// An element that can be selected in a diagram or its layer tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Figure(FigureId),
    Layer(LayerId),
    Connection(ConnectionId),
}

impl From<FigureId> for Element {
    fn from(id: FigureId) -> Self {
        Self::Figure(id)
    }
}

impl From<LayerId> for Element {
    fn from(id: LayerId) -> Self {
        Self::Layer(id)
    }
}

impl From<ConnectionId> for Element {
    fn from(id: ConnectionId) -> Self {
        Self::Connection(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub id: DiagramId,
    pub model: ModelId,
    pub name: String,
    pub root_layer: LayerId,
    /// All layers including the root, root first.
    pub layers: Vec<LayerId>,
    /// All figures in z-order.
    pub figures: Vec<FigureId>,
    pub connections: Vec<ConnectionId>,
    pub selection: Vec<Element>,
}

impl Diagram {
    pub fn new(id: DiagramId, model: ModelId, name: impl Into<String>, root_layer: LayerId) -> Self {
        Self {
            id,
            model,
            name: name.into(),
            root_layer,
            layers: vec![root_layer],
            figures: Vec::new(),
            connections: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn is_selected(&self, element: Element) -> bool {
        self.selection.contains(&element)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub diagram: DiagramId,
    pub name: String,
    /// Absolute bounds; ignored for the root layer.
    pub bounds: Bounds,
    pub color: Color,
    pub is_root: bool,
    /// Figures contained in this layer, in insertion order.
    pub figures: Vec<FigureId>,
}

impl Layer {
    pub fn new(id: LayerId, diagram: DiagramId, name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id,
            diagram,
            name: name.into(),
            bounds,
            color: Color::default(),
            is_root: false,
            figures: Vec::new(),
        }
    }

    /// Creates the unbounded root layer of a diagram.
    pub fn root(id: LayerId, diagram: DiagramId) -> Self {
        Self {
            is_root: true,
            ..Self::new(id, diagram, "root", Bounds::default())
        }
    }

    /// Returns the absolute origin figure offsets are relative to.
    pub fn origin(&self) -> Point {
        if self.is_root {
            Point::default()
        } else {
            self.bounds.min_point()
        }
    }

    /// Returns `true` if the absolute `point` lies inside this layer.
    ///
    /// The root layer contains every point.
    pub fn contains(&self, point: Point) -> bool {
        self.is_root || self.bounds.contains_point(point)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub id: FigureId,
    pub diagram: DiagramId,
    pub layer: LayerId,
    /// Bound catalog object; `None` for notes and images.
    pub object: Option<ObjectId>,
    pub kind: FigureKind,
    /// Offset from the owning layer's origin.
    pub position: Point,
    pub size: Size,
    pub color: Color,
    /// Free text of unbound figures (note body, image caption).
    pub text: Option<String>,
}

impl Figure {
    /// Returns the absolute bounds of the figure given its layer's origin.
    pub fn absolute_bounds(&self, layer_origin: Point) -> Bounds {
        Bounds::new_from_top_left(layer_origin.add_point(self.position), self.size)
    }
}

/// A visual edge derived from a foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub diagram: DiagramId,
    pub foreign_key: ObjectId,
    /// Figure of the table owning the foreign key.
    pub start: FigureId,
    /// Figure of the referenced table.
    pub end: FigureId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_layer_contains_everything() {
        let root = Layer::root(LayerId::from_raw(1), DiagramId::from_raw(2));
        assert!(root.contains(Point::new(-1000.0, 5000.0)));
        assert_eq!(root.origin(), Point::default());
    }

    #[test]
    fn test_layer_contains_and_origin() {
        let layer = Layer::new(
            LayerId::from_raw(3),
            DiagramId::from_raw(2),
            "billing",
            Bounds::from_rect(400.0, 0.0, 300.0, 300.0),
        );
        assert!(layer.contains(Point::new(450.0, 10.0)));
        assert!(!layer.contains(Point::new(10.0, 10.0)));
        assert_eq!(layer.origin(), Point::new(400.0, 0.0));
    }

    #[test]
    fn test_figure_absolute_bounds() {
        let figure = Figure {
            id: FigureId::from_raw(4),
            diagram: DiagramId::from_raw(2),
            layer: LayerId::from_raw(3),
            object: None,
            kind: FigureKind::Note,
            position: Point::new(20.0, 30.0),
            size: Size::new(100.0, 50.0),
            color: Color::default(),
            text: Some("remember".to_string()),
        };
        let bounds = figure.absolute_bounds(Point::new(400.0, 0.0));
        assert_eq!(bounds.min_point(), Point::new(420.0, 30.0));
        assert_eq!(bounds.max_x(), 520.0);
    }

    #[test]
    fn test_new_diagram_starts_with_root_layer() {
        let diagram = Diagram::new(
            DiagramId::from_raw(2),
            ModelId::from_raw(1),
            "main",
            LayerId::from_raw(3),
        );
        assert_eq!(diagram.layers, vec![LayerId::from_raw(3)]);
        assert!(!diagram.is_selected(Element::Layer(LayerId::from_raw(3))));
    }
}
