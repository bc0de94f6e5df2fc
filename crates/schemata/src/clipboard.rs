//! Copy, cut and paste.
//!
//! Copying takes detached copies of the selected figures, their catalog
//! objects (tables together with their foreign keys) and selected layers
//! with their figures. Pasting duplicates every object under a free name,
//! then remaps foreign key targets and routine group members among the
//! copies in one pass. Connections between the copies are left to the
//! synchronizer.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, info};

use schemata_core::{
    catalog::{CatalogObject, ObjectBody},
    color::Color,
    diagram::{Element, Figure, Layer},
    geometry::{Bounds, Point, Size},
    identifier::{DiagramId, FigureId, LayerId, ModelId, ObjectId},
    kind::FigureKind,
};

use crate::{
    error::{Result, SchemataError},
    naming::copy_name,
    prompt::{Answer, Question},
    workspace::Workspace,
};

/// Schema-qualified name used to resolve references in another model.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QualifiedName {
    schema: String,
    name: String,
}

/// A copied figure. Positions are absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipFigure {
    pub kind: FigureKind,
    /// Original object id; the copy is stored in the clipboard.
    pub object: Option<ObjectId>,
    pub position: Point,
    pub size: Size,
    pub color: Color,
    pub text: Option<String>,
}

/// A copied layer with its figures.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipLayer {
    pub name: String,
    pub bounds: Bounds,
    pub color: Color,
    pub figures: Vec<ClipFigure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClipEntry {
    Figure(ClipFigure),
    Layer(ClipLayer),
}

/// Detached copy of a selection.
#[derive(Debug, Clone)]
pub struct Clipboard {
    source_model: ModelId,
    entries: Vec<ClipEntry>,
    /// Copies of the catalog objects, keyed by the original id.
    objects: IndexMap<ObjectId, CatalogObject>,
    /// Names of copied objects and of everything they reference.
    names: HashMap<ObjectId, QualifiedName>,
}

impl Clipboard {
    fn new(source_model: ModelId) -> Self {
        Self {
            source_model,
            entries: Vec::new(),
            objects: IndexMap::new(),
            names: HashMap::new(),
        }
    }

    pub fn source_model(&self) -> ModelId {
        self.source_model
    }

    pub fn entries(&self) -> &[ClipEntry] {
        &self.entries
    }

    /// Returns the copied object for an original id.
    pub fn object(&self, original: ObjectId) -> Option<&CatalogObject> {
        self.objects.get(&original)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bookkeeping of one paste.
#[derive(Default)]
struct PasteState {
    /// Original object id to copy id, foreign keys included.
    id_map: HashMap<ObjectId, ObjectId>,
    figures: Vec<FigureId>,
    layers: Vec<LayerId>,
}

impl Workspace {
    /// Copies the selection of `diagram`.
    pub fn copy(&mut self, diagram: DiagramId) -> Result<Clipboard> {
        let selection = self.require_diagram(diagram)?.selection.clone();
        self.copy_elements(diagram, &selection)
    }

    /// Copies `elements` of `diagram`. Connections are skipped; they are
    /// re-derived on paste.
    pub fn copy_elements(&mut self, diagram: DiagramId, elements: &[Element]) -> Result<Clipboard> {
        let clipboard = self.build_clipboard(diagram, elements)?;
        info!(diagram:% = diagram, entries = clipboard.len(); "Copied selection");
        self.set_status(format!("Copied {} element(s)", clipboard.len()));
        Ok(clipboard)
    }

    /// Copies the selection of `diagram`, then deletes it with its objects.
    pub fn cut(&mut self, diagram: DiagramId) -> Result<Clipboard> {
        self.run_transaction("Cut", |ws| {
            let selection = ws.require_diagram(diagram)?.selection.clone();
            let clipboard = ws.build_clipboard(diagram, &selection)?;
            ws.delete_elements(&selection, false)?;
            ws.set_status(format!("Cut {} element(s)", clipboard.len()));
            Ok(clipboard)
        })
    }

    /// Pastes `clipboard` into `diagram` and returns the new figures.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::UserCancelled`] and rolls back everything
    /// pasted so far if the user cancels a duplicate confirmation.
    pub fn paste(&mut self, diagram: DiagramId, clipboard: &Clipboard) -> Result<Vec<FigureId>> {
        self.run_transaction("Paste", |ws| {
            let model = ws.require_diagram(diagram)?.model;
            let count = ws.paste_counts.get(&diagram).copied().unwrap_or(0) + 1;
            let step = ws.config.canvas().paste_offset() * count as f32;
            let offset = Point::new(step, step);

            let mut state = PasteState::default();
            for entry in &clipboard.entries {
                match entry {
                    ClipEntry::Figure(figure) => {
                        ws.paste_figure(diagram, model, clipboard, figure, offset, None, &mut state)?;
                    }
                    ClipEntry::Layer(layer) => {
                        let id = ws.insert_layer(diagram, layer.bounds.translate(offset), &layer.name)?;
                        let color = layer.color;
                        ws.store.update::<Layer, _>(id, |l| l.color = color);
                        state.layers.push(id);
                        for figure in &layer.figures {
                            ws.paste_figure(diagram, model, clipboard, figure, offset, Some(id), &mut state)?;
                        }
                    }
                }
            }
            ws.remap_references(clipboard, model, &state.id_map);
            if !state.layers.is_empty() {
                ws.revalidate_layers(diagram);
            }
            ws.pump();

            let selection = state
                .figures
                .iter()
                .map(|id| Element::Figure(*id))
                .chain(state.layers.iter().map(|id| Element::Layer(*id)))
                .collect();
            ws.set_selection(diagram, selection)?;
            ws.paste_counts.insert(diagram, count);
            info!(diagram:% = diagram, figures = state.figures.len(); "Pasted");
            ws.set_status(format!("Pasted {} figure(s)", state.figures.len()));
            Ok(state.figures)
        })
    }

    fn build_clipboard(&self, diagram: DiagramId, elements: &[Element]) -> Result<Clipboard> {
        let d = self.require_diagram(diagram)?;
        let mut clipboard = Clipboard::new(d.model);
        let selected_layers: Vec<LayerId> = elements
            .iter()
            .filter_map(|element| match element {
                Element::Layer(id) => Some(*id),
                _ => None,
            })
            .collect();

        for element in elements {
            match *element {
                Element::Figure(id) => {
                    let figure = self.store.figure(id).ok_or_else(|| SchemataError::not_found(id))?;
                    // Figures of a selected layer travel with the layer.
                    if selected_layers.contains(&figure.layer) {
                        continue;
                    }
                    let clip = self.clip_figure(figure, &mut clipboard);
                    clipboard.entries.push(ClipEntry::Figure(clip));
                }
                Element::Layer(id) => {
                    let layer = self.store.layer(id).ok_or_else(|| SchemataError::not_found(id))?;
                    if layer.is_root {
                        continue;
                    }
                    let figures = layer
                        .figures
                        .iter()
                        .filter_map(|f| self.store.figure(*f))
                        .map(|figure| self.clip_figure(figure, &mut clipboard))
                        .collect();
                    clipboard.entries.push(ClipEntry::Layer(ClipLayer {
                        name: layer.name.clone(),
                        bounds: layer.bounds,
                        color: layer.color,
                        figures,
                    }));
                }
                Element::Connection(_) => {}
            }
        }
        Ok(clipboard)
    }

    fn clip_figure(&self, figure: &Figure, clipboard: &mut Clipboard) -> ClipFigure {
        let position = self
            .store
            .figure_bounds(figure.id)
            .map(|b| b.min_point())
            .unwrap_or(figure.position);
        if let Some(object) = figure.object {
            self.clip_object(object, clipboard);
        }
        ClipFigure {
            kind: figure.kind,
            object: figure.object,
            position,
            size: figure.size,
            color: figure.color,
            text: figure.text.clone(),
        }
    }

    /// Stores a detached copy of `object` (and the foreign keys of a table)
    /// plus the names needed to resolve its references elsewhere.
    fn clip_object(&self, object: ObjectId, clipboard: &mut Clipboard) {
        let Some(original) = self.store.object(object) else {
            return;
        };
        let mut copied = vec![original];
        if let Some(table) = original.as_table() {
            copied.extend(table.foreign_keys.iter().filter_map(|id| self.store.object(*id)));
        }
        let mut referenced = vec![object];
        for o in copied {
            clipboard.objects.insert(o.id, o.detached_copy());
            match &o.body {
                ObjectBody::ForeignKey(fk) => referenced.extend(fk.target),
                ObjectBody::RoutineGroup(group) => referenced.extend(group.routines.iter().copied()),
                _ => {}
            }
        }
        for id in referenced {
            if let Some(name) = self.qualified_name(id) {
                clipboard.names.insert(id, name);
            }
        }
    }

    fn qualified_name(&self, object: ObjectId) -> Option<QualifiedName> {
        let o = self.store.object(object)?;
        let schema = self.store.object(o.parent?)?;
        Some(QualifiedName {
            schema: schema.name.clone(),
            name: o.name.clone(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn paste_figure(
        &mut self,
        diagram: DiagramId,
        model: ModelId,
        clipboard: &Clipboard,
        clip: &ClipFigure,
        offset: Point,
        layer: Option<LayerId>,
        state: &mut PasteState,
    ) -> Result<()> {
        let object = match clip.object {
            None => None,
            Some(original) => {
                if state.id_map.contains_key(&original) {
                    // Already pasted through another entry.
                    return Ok(());
                }
                let shown = self.store.object(original).is_some()
                    && self.store.figure_for(diagram, original).is_some();
                if shown {
                    let name = self.object_name(original);
                    match self.ask(Question::DuplicateObject { name }) {
                        Answer::Yes => {}
                        Answer::No => {
                            debug!(object:% = original; "Paste skipped object");
                            return Ok(());
                        }
                        Answer::Cancel => return Err(SchemataError::UserCancelled),
                    }
                }
                Some(self.paste_object(clipboard, original, model, state)?)
            }
        };
        let figure = self.insert_figure_with(
            diagram,
            clip.position.add_point(offset),
            clip.kind,
            object,
            clip.size,
            clip.color,
            clip.text.clone(),
            layer,
        )?;
        state.figures.push(figure);
        Ok(())
    }

    /// Inserts a copy of a clipboard object into `model`.
    fn paste_object(
        &mut self,
        clipboard: &Clipboard,
        original: ObjectId,
        model: ModelId,
        state: &mut PasteState,
    ) -> Result<ObjectId> {
        let source = clipboard
            .objects
            .get(&original)
            .ok_or_else(|| SchemataError::not_found(original))?;
        let same_model_parent = source
            .parent
            .filter(|_| model == clipboard.source_model)
            .filter(|parent| self.store.object(*parent).is_some_and(|p| p.as_schema().is_some()));
        let parent = match same_model_parent {
            Some(parent) => parent,
            None => {
                let schema = clipboard
                    .names
                    .get(&original)
                    .map(|q| q.schema.clone())
                    .unwrap_or_else(|| "public".to_string());
                self.ensure_schema(model, &schema)?
            }
        };
        let foreign_keys: Vec<CatalogObject> = source
            .as_table()
            .map(|t| {
                t.foreign_keys
                    .iter()
                    .filter_map(|id| clipboard.objects.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        let mapping = self.insert_copy(source, &foreign_keys, model, Some(parent));
        let copy = mapping.first().map(|(_, to)| *to).unwrap_or(original);
        state.id_map.extend(mapping);
        Ok(copy)
    }

    /// Inserts a copy of `source` and of its `foreign_keys` under `parent`.
    ///
    /// The copy gets a free `_copy` name. Returns `(original, copy)` id
    /// pairs, the object itself first. Foreign key targets are left as they
    /// are.
    pub(crate) fn insert_copy(
        &mut self,
        source: &CatalogObject,
        foreign_keys: &[CatalogObject],
        model: ModelId,
        parent: Option<ObjectId>,
    ) -> Vec<(ObjectId, ObjectId)> {
        let taken = self
            .store
            .sibling_names(model, parent, source.kind().namespace());
        let id = self.store.ids().object();
        let mut mapping = vec![(source.id, id)];
        let fk_copies: Vec<CatalogObject> = foreign_keys
            .iter()
            .map(|fk| {
                let fk_id = self.store.ids().object();
                mapping.push((fk.id, fk_id));
                CatalogObject {
                    id: fk_id,
                    model,
                    parent: Some(id),
                    ..fk.detached_copy()
                }
            })
            .collect();

        let mut copy = CatalogObject {
            id,
            model,
            parent,
            name: copy_name(&source.name, &taken),
            ..source.detached_copy()
        };
        if let Some(table) = copy.as_table_mut() {
            table.foreign_keys.clear();
            for index in &mut table.indexes {
                index.foreign_key = index.foreign_key.and_then(|old| {
                    mapping
                        .iter()
                        .find(|(from, _)| *from == old)
                        .map(|(_, to)| *to)
                });
            }
        }
        self.insert_prepared(copy);
        for fk in fk_copies {
            self.insert_prepared(fk);
        }
        debug!(original:% = source.id, copy:% = id; "Inserted copy");
        mapping
    }

    /// Points foreign keys and routine group members of the copies at the
    /// other copies, or resolves them by name when pasting into another
    /// model.
    fn remap_references(&mut self, clipboard: &Clipboard, model: ModelId, id_map: &HashMap<ObjectId, ObjectId>) {
        for &copy in id_map.values() {
            let Some(body) = self.store.object(copy).map(|o| o.body.clone()) else {
                continue;
            };
            match body {
                ObjectBody::ForeignKey(fk) => {
                    let target = fk
                        .target
                        .and_then(|t| self.remap_reference(clipboard, model, id_map, t));
                    if target != fk.target {
                        self.store.update::<CatalogObject, _>(copy, |o| {
                            if let Some(fk) = o.as_foreign_key_mut() {
                                fk.target = target;
                            }
                        });
                    }
                }
                ObjectBody::RoutineGroup(group) => {
                    let routines: Vec<ObjectId> = group
                        .routines
                        .iter()
                        .filter_map(|r| self.remap_reference(clipboard, model, id_map, *r))
                        .collect();
                    self.store.update::<CatalogObject, _>(copy, |o| {
                        if let Some(g) = o.as_routine_group_mut() {
                            g.routines = routines;
                        }
                    });
                }
                _ => {}
            }
        }
    }

    fn remap_reference(
        &self,
        clipboard: &Clipboard,
        model: ModelId,
        id_map: &HashMap<ObjectId, ObjectId>,
        reference: ObjectId,
    ) -> Option<ObjectId> {
        if let Some(copy) = id_map.get(&reference) {
            return Some(*copy);
        }
        if model == clipboard.source_model {
            return Some(reference);
        }
        let qualified = clipboard.names.get(&reference)?;
        let schema = self.store.find_child(model, None, &qualified.schema)?;
        self.store.find_child(model, Some(schema), &qualified.name)
    }
}
