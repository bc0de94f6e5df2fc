//! Layer tree projection of a diagram.
//!
//! The tree mirrors containment: figures of the root layer at the top
//! level, followed by one node per layer holding that layer's figures. Each
//! figure node lists its outgoing connections as leaves.
//!
//! The tree follows the change feed incrementally. Moving a figure between
//! layers relocates its node; only adding or removing a layer triggers a
//! full rebuild, and that rebuild is deferred while a batch is open.

use std::fmt::Write as _;

use indexmap::IndexMap;
use log::{debug, trace};

use schemata_core::{
    diagram::Element,
    identifier::{ConnectionId, DiagramId, FigureId, LayerId},
};

use crate::{change::Change, store::Store};

#[derive(Debug, Clone)]
struct Node {
    parent: Option<Element>,
    children: Vec<Element>,
    label: String,
}

/// Tree view of one diagram.
#[derive(Debug, Clone)]
pub struct LayerTree {
    diagram: DiagramId,
    nodes: IndexMap<Element, Node>,
    roots: Vec<Element>,
    selection: Vec<Element>,
    /// Set while the tree pushes its selection into the diagram.
    syncing_selection: bool,
    rebuild_pending: bool,
    rebuilds: usize,
    relocations: usize,
}

impl LayerTree {
    pub(crate) fn new(diagram: DiagramId) -> Self {
        Self {
            diagram,
            nodes: IndexMap::new(),
            roots: Vec::new(),
            selection: Vec::new(),
            syncing_selection: false,
            rebuild_pending: true,
            rebuilds: 0,
            relocations: 0,
        }
    }

    pub fn diagram(&self) -> DiagramId {
        self.diagram
    }

    /// Returns the top-level nodes: root layer figures, then layers.
    pub fn roots(&self) -> &[Element] {
        &self.roots
    }

    pub fn children(&self, element: Element) -> &[Element] {
        self.nodes
            .get(&element)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the parent node, `None` for top-level or unknown nodes.
    pub fn parent(&self, element: Element) -> Option<Element> {
        self.nodes.get(&element).and_then(|node| node.parent)
    }

    pub fn label(&self, element: Element) -> Option<&str> {
        self.nodes.get(&element).map(|node| node.label.as_str())
    }

    pub fn contains(&self, element: Element) -> bool {
        self.nodes.contains_key(&element)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn selection(&self) -> &[Element] {
        &self.selection
    }

    /// Number of full rebuilds so far.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    /// Number of nodes moved between parents so far.
    pub fn relocation_count(&self) -> usize {
        self.relocations
    }

    pub fn is_rebuild_pending(&self) -> bool {
        self.rebuild_pending
    }

    /// Renders the tree as indented text, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.render_node(*root, 0, &mut out);
        }
        out
    }

    fn render_node(&self, element: Element, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&element) else {
            return;
        };
        let marker = if self.selection.contains(&element) { "*" } else { "" };
        let tag = match element {
            Element::Figure(_) => "figure",
            Element::Layer(_) => "layer",
            Element::Connection(_) => "connection",
        };
        let _ = writeln!(out, "{:indent$}{tag} {}{marker}", "", node.label, indent = depth * 2);
        for child in &node.children {
            self.render_node(*child, depth + 1, out);
        }
    }

    /// Rebuilds the whole tree from the store.
    pub(crate) fn rebuild(&mut self, store: &Store) {
        self.nodes.clear();
        self.roots.clear();
        self.rebuild_pending = false;
        self.rebuilds += 1;

        let Some(diagram) = store.diagram(self.diagram) else {
            return;
        };
        debug!(diagram:% = self.diagram, rebuilds = self.rebuilds; "Rebuilding layer tree");

        for &layer_id in &diagram.layers {
            let Some(layer) = store.layer(layer_id) else {
                continue;
            };
            let parent = if layer.is_root {
                None
            } else {
                let element = Element::Layer(layer_id);
                self.nodes.insert(
                    element,
                    Node {
                        parent: None,
                        children: Vec::new(),
                        label: layer.name.clone(),
                    },
                );
                Some(element)
            };
            for &figure in &layer.figures {
                self.insert_figure(store, figure, parent);
            }
        }
        // Root layer figures come first, then the layers.
        let (figures, layers): (Vec<Element>, Vec<Element>) = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(element, _)| *element)
            .partition(|element| matches!(element, Element::Figure(_)));
        self.roots = figures.into_iter().chain(layers).collect();

        for &connection in &diagram.connections {
            self.insert_connection(store, connection);
        }
        self.selection = diagram
            .selection
            .iter()
            .copied()
            .filter(|element| self.nodes.contains_key(element))
            .collect();
    }

    /// Drops incremental tracking until the next flush rebuilds the tree.
    ///
    /// Replayed records arrive in reverse order, so a connection can show up
    /// before its start figure.
    pub(crate) fn invalidate(&mut self) {
        self.rebuild_pending = true;
    }

    /// Runs a deferred rebuild, if one is pending.
    pub(crate) fn flush(&mut self, store: &Store) {
        if self.rebuild_pending {
            self.rebuild(store);
        }
    }

    /// Reacts to one change. `frozen` defers rebuilds until [`Self::flush`].
    pub(crate) fn on_change(&mut self, store: &Store, change: &Change, frozen: bool) {
        match *change {
            Change::LayerAdded { .. } | Change::LayerRemoved { .. } => {
                self.rebuild_pending = true;
            }
            _ if self.rebuild_pending => {}
            Change::LayerChanged { layer, .. } => {
                if let Some(node) = self.nodes.get_mut(&Element::Layer(layer)) {
                    node.label = store.layer(layer).map(|l| l.name.clone()).unwrap_or_default();
                }
            }
            Change::FigureAdded { figure, .. } => {
                let parent = self.layer_node(store, figure);
                self.insert_figure(store, figure, parent);
                if parent.is_none() {
                    self.place_root_figure(Element::Figure(figure));
                }
            }
            Change::FigureChanged { figure, .. } => {
                if let Some(node) = self.nodes.get_mut(&Element::Figure(figure)) {
                    node.label = store.figure_label(figure);
                }
            }
            Change::FigureRelayered { figure, to, .. } => self.relocate(store, figure, to),
            Change::FigureRemoved { figure, .. } => self.remove_node(Element::Figure(figure)),
            Change::ConnectionAdded { connection, .. } => self.insert_connection(store, connection),
            Change::ConnectionChanged { connection, .. } => {
                self.remove_node(Element::Connection(connection));
                self.insert_connection(store, connection);
            }
            Change::ConnectionRemoved { connection, .. } => {
                self.remove_node(Element::Connection(connection));
            }
            Change::ObjectChanged { object, .. } => {
                for figure in store.figures_bound_to(object) {
                    if let Some(node) = self.nodes.get_mut(&Element::Figure(figure)) {
                        node.label = store.figure_label(figure);
                    }
                }
            }
            Change::DiagramChanged(_) => self.pull_selection(store),
            _ => {}
        }
        if !frozen {
            self.flush(store);
        }
    }

    /// Copies the diagram selection into the tree unless the tree itself is
    /// the origin of the change.
    fn pull_selection(&mut self, store: &Store) {
        if self.syncing_selection {
            return;
        }
        if let Some(diagram) = store.diagram(self.diagram) {
            self.selection = diagram
                .selection
                .iter()
                .copied()
                .filter(|element| self.nodes.contains_key(element))
                .collect();
        }
    }

    /// Marks the start of a tree-originated selection change.
    pub(crate) fn begin_selection_push(&mut self, selection: Vec<Element>) {
        self.syncing_selection = true;
        self.selection = selection;
    }

    pub(crate) fn end_selection_push(&mut self) {
        self.syncing_selection = false;
    }

    fn layer_node(&self, store: &Store, figure: FigureId) -> Option<Element> {
        let layer = store.figure(figure)?.layer;
        self.layer_parent(store, layer)
    }

    fn layer_parent(&self, store: &Store, layer: LayerId) -> Option<Element> {
        match store.layer(layer) {
            Some(l) if !l.is_root => Some(Element::Layer(layer)),
            _ => None,
        }
    }

    fn insert_figure(&mut self, store: &Store, figure: FigureId, parent: Option<Element>) {
        let element = Element::Figure(figure);
        self.nodes.insert(
            element,
            Node {
                parent,
                children: Vec::new(),
                label: store.figure_label(figure),
            },
        );
        if let Some(node) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            node.children.push(element);
        }
    }

    fn place_root_figure(&mut self, element: Element) {
        let at = self
            .roots
            .iter()
            .position(|root| matches!(root, Element::Layer(_)))
            .unwrap_or(self.roots.len());
        self.roots.insert(at, element);
    }

    fn insert_connection(&mut self, store: &Store, connection: ConnectionId) {
        let Some(c) = store.connection(connection) else {
            return;
        };
        let parent = Element::Figure(c.start);
        let element = Element::Connection(connection);
        let Some(node) = self.nodes.get_mut(&parent) else {
            return;
        };
        node.children.push(element);
        let label = store
            .object(c.foreign_key)
            .map(|fk| fk.name.clone())
            .unwrap_or_default();
        self.nodes.insert(
            element,
            Node {
                parent: Some(parent),
                children: Vec::new(),
                label,
            },
        );
    }

    /// Moves a figure node under the node of layer `to`.
    fn relocate(&mut self, store: &Store, figure: FigureId, to: LayerId) {
        let element = Element::Figure(figure);
        let Some(node) = self.nodes.get(&element) else {
            return;
        };
        let old_parent = node.parent;
        let new_parent = self.layer_parent(store, to);
        if old_parent == new_parent {
            return;
        }
        self.detach(element, old_parent);
        match new_parent {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.push(element);
                }
            }
            None => self.place_root_figure(element),
        }
        if let Some(node) = self.nodes.get_mut(&element) {
            node.parent = new_parent;
        }
        self.relocations += 1;
        trace!(figure:% = figure, to:% = to; "Relocated tree node");
    }

    fn detach(&mut self, element: Element, parent: Option<Element>) {
        match parent {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.retain(|child| *child != element);
                }
            }
            None => self.roots.retain(|root| *root != element),
        }
    }

    fn remove_node(&mut self, element: Element) {
        let Some(node) = self.nodes.shift_remove(&element) else {
            return;
        };
        self.detach(element, node.parent);
        for child in node.children {
            self.nodes.shift_remove(&child);
        }
        self.selection.retain(|selected| *selected != element);
    }
}
