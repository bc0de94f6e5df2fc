//! Layers, dragging and selection.
//!
//! A figure belongs to the innermost layer containing its top-left corner,
//! where innermost means smallest area and the root layer is the fallback.
//! On an area tie a figure keeps the layer it is already in.
//! Every operation here that moves a figure or changes a layer re-validates
//! that assignment for the whole diagram.

use log::{debug, info};

use schemata_core::{
    diagram::{Diagram, Element, Figure, Layer},
    geometry::{Bounds, Point},
    identifier::{DiagramId, FigureId, LayerId},
    kind::FigureKind,
};

use crate::{
    error::{Result, SchemataError},
    naming::unique_name,
    workspace::Workspace,
};

impl Workspace {
    /// Adds a layer with absolute `bounds`.
    ///
    /// Figures now inside the layer move into it.
    pub fn add_layer(&mut self, diagram: DiagramId, bounds: Bounds, name: &str) -> Result<LayerId> {
        self.run_transaction("Add layer", |ws| {
            let layer = ws.insert_layer(diagram, bounds, name)?;
            ws.revalidate_layers(diagram);
            ws.set_status(format!("Added layer {}", ws.layer_name(layer)));
            Ok(layer)
        })
    }

    /// Drags a figure so its top-left corner lands on the absolute `point`.
    pub fn move_figure(&mut self, figure: FigureId, point: Point) -> Result<()> {
        self.run_transaction("Move figure", |ws| {
            let diagram = ws
                .store
                .figure(figure)
                .map(|f| f.diagram)
                .ok_or_else(|| SchemataError::not_found(figure))?;
            let point = ws.canvas.snap(point);
            let target = ws.innermost_layer(diagram, point)?;
            ws.assign_layer(figure, target, point);
            ws.revalidate_layers(diagram);
            info!(figure:% = figure, layer:% = target; "Moved figure");
            ws.set_status(format!("Moved {}", ws.store.figure_label(figure)));
            Ok(())
        })
    }

    /// Moves a layer by `delta`; its figures move with it.
    pub fn move_layer(&mut self, layer: LayerId, delta: Point) -> Result<()> {
        self.run_transaction("Move layer", |ws| {
            let diagram = ws.require_movable_layer(layer)?;
            ws.store
                .update::<Layer, _>(layer, |l| l.bounds = l.bounds.translate(delta));
            ws.revalidate_layers(diagram);
            ws.set_status(format!("Moved layer {}", ws.layer_name(layer)));
            Ok(())
        })
    }

    /// Gives a layer new absolute bounds.
    ///
    /// Figures keep their absolute position; those no longer inside the
    /// layer fall through to the enclosing one.
    pub fn resize_layer(&mut self, layer: LayerId, bounds: Bounds) -> Result<()> {
        self.run_transaction("Resize layer", |ws| {
            let diagram = ws.require_movable_layer(layer)?;
            ws.set_layer_bounds(layer, bounds);
            ws.revalidate_layers(diagram);
            ws.set_status(format!("Resized layer {}", ws.layer_name(layer)));
            Ok(())
        })
    }

    /// Replaces the selection of `diagram`.
    pub fn select(&mut self, diagram: DiagramId, elements: &[Element]) -> Result<()> {
        self.run_transaction("Select", |ws| {
            ws.set_selection(diagram, elements.to_vec())?;
            ws.set_status(format!("Selected {} element(s)", elements.len()));
            Ok(())
        })
    }

    pub fn clear_selection(&mut self, diagram: DiagramId) -> Result<()> {
        self.run_transaction("Clear selection", |ws| {
            ws.set_selection(diagram, Vec::new())?;
            ws.set_status("Selection cleared");
            Ok(())
        })
    }

    /// Selects elements from the layer tree and pushes the selection into
    /// the diagram without echoing it back to the tree.
    pub fn select_in_tree(&mut self, diagram: DiagramId, elements: &[Element]) -> Result<()> {
        let Some(tree) = self.trees.get_mut(&diagram) else {
            return Err(SchemataError::not_found(diagram));
        };
        tree.begin_selection_push(elements.to_vec());
        let result = self.select(diagram, elements);
        if let Some(tree) = self.trees.get_mut(&diagram) {
            tree.end_selection_push();
        }
        result
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Returns the innermost layer of `diagram` containing `point`.
    pub fn innermost_layer(&self, diagram: DiagramId, point: Point) -> Result<LayerId> {
        let d = self.require_diagram(diagram)?;
        let innermost = d
            .layers
            .iter()
            .filter_map(|id| self.store.layer(*id))
            .filter(|layer| !layer.is_root && layer.contains(point))
            .min_by(|a, b| a.bounds.area().total_cmp(&b.bounds.area()))
            .map(|layer| layer.id);
        Ok(innermost.unwrap_or(d.root_layer))
    }

    fn require_movable_layer(&self, layer: LayerId) -> Result<DiagramId> {
        let l = self
            .store
            .layer(layer)
            .ok_or_else(|| SchemataError::not_found(layer))?;
        if l.is_root {
            return Err(SchemataError::invalid("the root layer cannot be moved or resized"));
        }
        Ok(l.diagram)
    }

    pub(crate) fn layer_name(&self, layer: LayerId) -> String {
        self.store
            .layer(layer)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| layer.to_string())
    }

    /// Creates a layer without re-validating containment.
    pub(crate) fn insert_layer(&mut self, diagram: DiagramId, bounds: Bounds, name: &str) -> Result<LayerId> {
        let taken: Vec<String> = self
            .require_diagram(diagram)?
            .layers
            .iter()
            .filter_map(|id| self.store.layer(*id).map(|l| l.name.clone()))
            .collect();
        let name = unique_name(name, &taken);
        let color = self
            .config
            .tool(FigureKind::Layer)
            .color()
            .map_err(SchemataError::Config)?
            .unwrap_or_default();
        let id = self.store.ids().layer();
        let mut layer = Layer::new(id, diagram, name, bounds);
        layer.color = color;
        self.store.insert(id, layer);
        self.store.update::<Diagram, _>(diagram, |d| d.layers.push(id));
        debug!(layer:% = id, diagram:% = diagram; "Inserted layer");
        Ok(id)
    }

    /// Sets layer bounds while keeping its figures' absolute positions.
    pub(crate) fn set_layer_bounds(&mut self, layer: LayerId, bounds: Bounds) {
        let Some(old_origin) = self.store.layer(layer).map(Layer::origin) else {
            return;
        };
        let shift = old_origin.sub_point(bounds.min_point());
        let figures = self.store.layer(layer).map(|l| l.figures.clone()).unwrap_or_default();
        self.store.update::<Layer, _>(layer, |l| l.bounds = bounds);
        if shift.is_zero() {
            return;
        }
        for figure in figures {
            self.store
                .update::<Figure, _>(figure, |f| f.position = f.position.add_point(shift));
        }
    }

    /// Moves `figure` into `layer` with its top-left at the absolute `point`.
    pub(crate) fn assign_layer(&mut self, figure: FigureId, layer: LayerId, point: Point) {
        let Some(old_layer) = self.store.figure(figure).map(|f| f.layer) else {
            return;
        };
        let Some(origin) = self.store.layer(layer).map(Layer::origin) else {
            return;
        };
        self.store.update::<Figure, _>(figure, |f| {
            f.layer = layer;
            f.position = point.sub_point(origin);
        });
        if old_layer != layer {
            self.store
                .update::<Layer, _>(old_layer, |l| l.figures.retain(|id| *id != figure));
            self.store.update::<Layer, _>(layer, |l| l.figures.push(figure));
        }
    }

    /// Re-assigns every figure of `diagram` to its innermost layer.
    pub(crate) fn revalidate_layers(&mut self, diagram: DiagramId) {
        let figures = self
            .store
            .diagram(diagram)
            .map(|d| d.figures.clone())
            .unwrap_or_default();
        for figure in figures {
            let Some(bounds) = self.store.figure_bounds(figure) else {
                continue;
            };
            let point = bounds.min_point();
            let Ok(target) = self.innermost_layer(diagram, point) else {
                continue;
            };
            let Some(current) = self.store.figure(figure).map(|f| f.layer) else {
                continue;
            };
            if current != target && !self.still_encloses(current, target, point) {
                debug!(figure:% = figure, layer:% = target; "Figure changes layer");
                self.assign_layer(figure, target, point);
            }
        }
    }

    /// Whether `current` still contains `point` and is no larger than
    /// `candidate`, so a figure in it stays put on an area tie.
    fn still_encloses(&self, current: LayerId, candidate: LayerId, point: Point) -> bool {
        let (Some(current), Some(candidate)) = (self.store.layer(current), self.store.layer(candidate))
        else {
            return false;
        };
        !current.is_root
            && current.contains(point)
            && (candidate.is_root || current.bounds.area() <= candidate.bounds.area())
    }

    /// Grows a non-root layer to the right and down so `bounds` fits with
    /// the configured margin.
    pub(crate) fn grow_layer_to_fit(&mut self, layer: LayerId, bounds: Bounds) {
        let margin = self.config.canvas().layer_margin();
        let Some(current) = self.store.layer(layer).filter(|l| !l.is_root).map(|l| l.bounds) else {
            return;
        };
        if current.contains_bounds(bounds) {
            return;
        }
        let max_x = current.max_x().max(bounds.max_x() + margin);
        let max_y = current.max_y().max(bounds.max_y() + margin);
        let grown = Bounds::from_rect(
            current.min_x(),
            current.min_y(),
            max_x - current.min_x(),
            max_y - current.min_y(),
        );
        debug!(layer:% = layer; "Growing layer to fit figure");
        self.store.update::<Layer, _>(layer, |l| l.bounds = grown);
    }

    /// Replaces the selection after checking every element belongs to
    /// `diagram`.
    pub(crate) fn set_selection(&mut self, diagram: DiagramId, elements: Vec<Element>) -> Result<()> {
        self.require_diagram(diagram)?;
        for element in &elements {
            let owner = match *element {
                Element::Figure(id) => self.store.figure(id).map(|f| f.diagram),
                Element::Layer(id) => self.store.layer(id).map(|l| l.diagram),
                Element::Connection(id) => self.store.connection(id).map(|c| c.diagram),
            };
            if owner != Some(diagram) {
                return Err(SchemataError::invalid(format!(
                    "{element:?} is not part of diagram {diagram}"
                )));
            }
        }
        self.store
            .update::<Diagram, _>(diagram, |d| d.selection = elements);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use crate::placement::{PlaceOptions, Subject};

    use super::*;

    fn setup() -> (Workspace, DiagramId) {
        let mut ws = Workspace::default();
        let model = ws.create_model("m").unwrap();
        ws.create_schema(model, "public").unwrap();
        let diagram = ws.create_diagram(model, "main").unwrap();
        (ws, diagram)
    }

    fn note(ws: &mut Workspace, diagram: DiagramId, x: f32, y: f32) -> FigureId {
        ws.place(diagram, Point::new(x, y), Subject::Kind(FigureKind::Note), PlaceOptions::default())
            .unwrap()
            .figure()
            .unwrap()
    }

    #[test]
    fn test_innermost_layer_prefers_smallest() {
        let (mut ws, diagram) = setup();
        let big = ws.add_layer(diagram, Bounds::from_rect(0.0, 0.0, 500.0, 500.0), "big").unwrap();
        let small = ws.add_layer(diagram, Bounds::from_rect(100.0, 100.0, 100.0, 100.0), "small").unwrap();
        let root = ws.store().diagram(diagram).unwrap().root_layer;

        assert_eq!(ws.innermost_layer(diagram, Point::new(150.0, 150.0)).unwrap(), small);
        assert_eq!(ws.innermost_layer(diagram, Point::new(50.0, 50.0)).unwrap(), big);
        assert_eq!(ws.innermost_layer(diagram, Point::new(900.0, 50.0)).unwrap(), root);
    }

    #[test]
    fn test_add_layer_adopts_figures_inside() {
        let (mut ws, diagram) = setup();
        let figure = note(&mut ws, diagram, 50.0, 50.0);
        let layer = ws.add_layer(diagram, Bounds::from_rect(0.0, 0.0, 300.0, 300.0), "l").unwrap();
        let f = ws.store().figure(figure).unwrap();
        assert_eq!(f.layer, layer);
        assert_eq!(f.position, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_move_layer_carries_figures() {
        let (mut ws, diagram) = setup();
        let layer = ws.add_layer(diagram, Bounds::from_rect(0.0, 0.0, 300.0, 300.0), "l").unwrap();
        let figure = note(&mut ws, diagram, 50.0, 50.0);
        ws.move_layer(layer, Point::new(100.0, 0.0)).unwrap();

        let bounds = ws.store().figure_bounds(figure).unwrap();
        assert_approx_eq!(f32, bounds.min_x(), 150.0);
        assert_eq!(ws.store().figure(figure).unwrap().layer, layer);
    }

    #[test]
    fn test_resize_layer_keeps_absolute_positions() {
        let (mut ws, diagram) = setup();
        let layer = ws.add_layer(diagram, Bounds::from_rect(100.0, 100.0, 300.0, 300.0), "l").unwrap();
        let inside = note(&mut ws, diagram, 150.0, 150.0);
        let far = note(&mut ws, diagram, 350.0, 350.0);
        ws.resize_layer(layer, Bounds::from_rect(120.0, 120.0, 100.0, 100.0)).unwrap();

        let root = ws.store().diagram(diagram).unwrap().root_layer;
        assert_eq!(ws.store().figure(inside).unwrap().layer, layer);
        assert_eq!(ws.store().figure_bounds(inside).unwrap().min_point(), Point::new(150.0, 150.0));
        assert_eq!(ws.store().figure(far).unwrap().layer, root);
        assert_eq!(ws.store().figure_bounds(far).unwrap().min_point(), Point::new(350.0, 350.0));
    }

    #[test]
    fn test_root_layer_cannot_move() {
        let (mut ws, diagram) = setup();
        let root = ws.store().diagram(diagram).unwrap().root_layer;
        assert!(ws.move_layer(root, Point::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn test_select_rejects_foreign_elements() {
        let (mut ws, diagram) = setup();
        let model = ws.store().diagram(diagram).unwrap().model;
        let other = ws.create_diagram(model, "other").unwrap();
        let figure = note(&mut ws, other, 0.0, 0.0);
        assert!(ws.select(diagram, &[Element::Figure(figure)]).is_err());
        ws.select(other, &[Element::Figure(figure)]).unwrap();
        assert_eq!(ws.tree(other).unwrap().selection(), &[Element::Figure(figure)]);
        ws.clear_selection(other).unwrap();
        assert!(ws.tree(other).unwrap().selection().is_empty());
    }
}
