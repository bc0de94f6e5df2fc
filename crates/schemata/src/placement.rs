//! Placement of figures, objects and layers onto a diagram.

use log::{debug, info};

use schemata_core::{
    catalog::{CatalogObject, Column, ObjectBody, RoutineGroup, Table, View},
    color::Color,
    diagram::{Diagram, Element, Figure, Layer},
    geometry::{Bounds, Point, Size},
    identifier::{DiagramId, FigureId, LayerId, ModelId, ObjectId},
    kind::{FigureKind, ObjectKind},
};

use crate::{
    config::ToolConfig,
    error::{Result, SchemataError},
    naming::next_default_name,
    prompt::{Answer, Question},
    registry::Instantiate,
    workspace::Workspace,
};

/// Name of the schema created when a model has none.
const DEFAULT_SCHEMA: &str = "public";

/// What to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// Run the placement tool of a kind, creating a new object if the kind
    /// is bound to one.
    Kind(FigureKind),
    /// Show an existing catalog object.
    Object(ObjectId),
}

/// Optional overrides for a placement.
#[derive(Debug, Clone, Default)]
pub struct PlaceOptions {
    /// Name of the new object or layer instead of a generated one. Notes
    /// and images have no name and use it as their text when `text` is unset.
    pub name: Option<String>,
    /// Schema a new object is created in.
    pub schema: Option<ObjectId>,
    /// Text of a note or image.
    pub text: Option<String>,
    /// Columns of a new table.
    pub columns: Vec<Column>,
}

impl PlaceOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: ObjectId) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }
}

/// Result of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placed {
    Figure {
        figure: FigureId,
        /// The bound object, if any.
        object: Option<ObjectId>,
    },
    Layer(LayerId),
}

impl Placed {
    pub fn figure(self) -> Option<FigureId> {
        match self {
            Self::Figure { figure, .. } => Some(figure),
            Self::Layer(_) => None,
        }
    }

    pub fn object(self) -> Option<ObjectId> {
        match self {
            Self::Figure { object, .. } => object,
            Self::Layer(_) => None,
        }
    }

    pub fn layer(self) -> Option<LayerId> {
        match self {
            Self::Layer(layer) => Some(layer),
            Self::Figure { .. } => None,
        }
    }
}

impl Workspace {
    /// Places `subject` with its top-left corner at the absolute `position`.
    ///
    /// The new figure (or layer) becomes the diagram's selection.
    ///
    /// # Errors
    ///
    /// - [`SchemataError::InvalidKind`] if the kind has no registered tool;
    ///   nothing is recorded.
    /// - [`SchemataError::UserCancelled`] if the object is already shown and
    ///   the user declines to duplicate it.
    pub fn place(
        &mut self,
        diagram: DiagramId,
        position: Point,
        subject: Subject,
        options: PlaceOptions,
    ) -> Result<Placed> {
        let kind = match subject {
            Subject::Kind(kind) => kind,
            Subject::Object(object) => FigureKind::for_object(self.require_object(object)?.kind()),
        };
        let (instantiate, title) = match self.registry.handler(kind) {
            Ok(handler) => (handler.instantiate(), handler.title()),
            Err(err) => {
                self.set_status(format!("Cannot place: {err}"));
                return Err(err);
            }
        };
        info!(diagram:% = diagram, kind:% = kind; "Placing");
        self.run_transaction(&format!("Place {kind}"), |ws| {
            ws.require_diagram(diagram)?;
            let point = ws.canvas.snap(position);
            let placed = match (subject, instantiate) {
                (_, Instantiate::Layer) => ws.place_layer(diagram, point, &options)?,
                (Subject::Object(object), _) => ws.place_existing(diagram, point, object)?,
                (Subject::Kind(_), Instantiate::Object(object_kind)) => {
                    ws.place_new_object(diagram, point, object_kind, &options)?
                }
                (Subject::Kind(_), Instantiate::Free) => {
                    let text = options.text.clone().or_else(|| options.name.clone());
                    let figure = ws.insert_figure(diagram, point, kind, None, text)?;
                    Placed::Figure {
                        figure,
                        object: None,
                    }
                }
            };
            ws.pump();
            let selection = match placed {
                Placed::Figure { figure, .. } => Element::Figure(figure),
                Placed::Layer(layer) => Element::Layer(layer),
            };
            ws.set_selection(diagram, vec![selection])?;
            let label = match placed {
                Placed::Figure { figure, .. } => ws.store.figure_label(figure),
                Placed::Layer(layer) => ws.layer_name(layer),
            };
            ws.set_status(format!("Placed {} {label}", title.to_lowercase()));
            Ok(placed)
        })
    }

    fn place_layer(&mut self, diagram: DiagramId, point: Point, options: &PlaceOptions) -> Result<Placed> {
        let tool = self.config.tool(FigureKind::Layer);
        let size = tool.size().unwrap_or(Size::new(300.0, 300.0));
        let name = match &options.name {
            Some(name) => name.clone(),
            None => {
                let taken: Vec<String> = self
                    .require_diagram(diagram)?
                    .layers
                    .iter()
                    .filter_map(|id| self.store.layer(*id).map(|l| l.name.clone()))
                    .collect();
                next_default_name(tool.name_prefix(), &taken)
            }
        };
        let layer = self.insert_layer(diagram, Bounds::new_from_top_left(point, size), &name)?;
        self.revalidate_layers(diagram);
        Ok(Placed::Layer(layer))
    }

    /// Shows an existing object, duplicating it if the diagram already has a
    /// figure for it and the user agrees.
    fn place_existing(&mut self, diagram: DiagramId, point: Point, object: ObjectId) -> Result<Placed> {
        let diagram_model = self.require_diagram(diagram)?.model;
        let found = self.require_object(object)?;
        if found.model != diagram_model {
            return Err(SchemataError::invalid(format!(
                "{} belongs to another model",
                found.name
            )));
        }
        let mut bound = object;
        if self.store.figure_for(diagram, object).is_some() {
            let name = found.name.clone();
            match self.ask(Question::DuplicateObject { name }) {
                Answer::Yes => bound = self.duplicate_object(object)?,
                Answer::No | Answer::Cancel => return Err(SchemataError::UserCancelled),
            }
        }
        let kind = FigureKind::for_object(self.require_object(bound)?.kind());
        let figure = self.insert_figure(diagram, point, kind, Some(bound), None)?;
        Ok(Placed::Figure {
            figure,
            object: Some(bound),
        })
    }

    fn place_new_object(
        &mut self,
        diagram: DiagramId,
        point: Point,
        kind: ObjectKind,
        options: &PlaceOptions,
    ) -> Result<Placed> {
        let model = self.require_diagram(diagram)?.model;
        let figure_kind = FigureKind::for_object(kind);
        let tool = self.config.tool(figure_kind);
        let schema = self.resolve_schema(model, options.schema, &tool)?;
        let body = match kind {
            ObjectKind::Table => ObjectBody::Table(Table {
                engine: tool.engine().map(str::to_string),
                ..Table::with_columns(options.columns.clone())
            }),
            ObjectKind::View => ObjectBody::View(View::default()),
            ObjectKind::RoutineGroup => ObjectBody::RoutineGroup(RoutineGroup::default()),
            other => return Err(SchemataError::InvalidKind(FigureKind::for_object(other))),
        };
        let name = match &options.name {
            Some(name) => name.clone(),
            None => {
                let taken = self.store.sibling_names(model, Some(schema), kind.namespace());
                next_default_name(tool.name_prefix(), &taken)
            }
        };
        let object = self.insert_object(model, Some(schema), &name, body)?;
        debug!(object:% = object, schema:% = schema; "Created object for placement");
        let figure = self.insert_figure(diagram, point, figure_kind, Some(object), None)?;
        Ok(Placed::Figure {
            figure,
            object: Some(object),
        })
    }

    /// Picks the schema for a new object: the explicit one, else the tool's
    /// default schema (created on demand), else the model's first schema.
    fn resolve_schema(&mut self, model: ModelId, explicit: Option<ObjectId>, tool: &ToolConfig) -> Result<ObjectId> {
        if let Some(schema) = explicit {
            let schema_model = self.require_kind(schema, ObjectKind::Schema)?;
            if schema_model != model {
                return Err(SchemataError::invalid("the schema belongs to another model"));
            }
            return Ok(schema);
        }
        if let Some(name) = tool.schema() {
            return self.ensure_schema(model, name);
        }
        match self.require_model(model)?.schemas.first() {
            Some(schema) => Ok(*schema),
            None => self.ensure_schema(model, DEFAULT_SCHEMA),
        }
    }

    /// Copies a catalog object next to the original under a free `_copy`
    /// name. Tables keep their foreign keys, which keep their targets.
    pub(crate) fn duplicate_object(&mut self, object: ObjectId) -> Result<ObjectId> {
        let original = self.require_object(object)?.clone();
        let foreign_keys: Vec<CatalogObject> = original
            .as_table()
            .map(|t| {
                t.foreign_keys
                    .iter()
                    .filter_map(|id| self.store.object(*id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        let mapping = self.insert_copy(&original, &foreign_keys, original.model, original.parent);
        let copy = mapping.first().map(|(_, to)| *to).unwrap_or(object);
        info!(original:% = object, copy:% = copy; "Duplicated object");
        Ok(copy)
    }

    /// Creates a figure at the absolute `point`, resolving its layer and
    /// growing that layer when the figure sticks out.
    pub(crate) fn insert_figure(
        &mut self,
        diagram: DiagramId,
        point: Point,
        kind: FigureKind,
        object: Option<ObjectId>,
        text: Option<String>,
    ) -> Result<FigureId> {
        let tool = self.config.tool(kind);
        let color = tool
            .color()
            .map_err(SchemataError::Config)?
            .unwrap_or_default();
        let size = self
            .canvas
            .figure_size(kind, object.and_then(|o| self.store.object(o)), tool.size());
        self.insert_figure_with(diagram, point, kind, object, size, color, text, None)
    }

    /// Creates a figure with explicit visual attributes.
    ///
    /// `layer` forces the owning layer instead of resolving it from `point`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_figure_with(
        &mut self,
        diagram: DiagramId,
        point: Point,
        kind: FigureKind,
        object: Option<ObjectId>,
        size: Size,
        color: Color,
        text: Option<String>,
        layer: Option<LayerId>,
    ) -> Result<FigureId> {
        let layer = match layer {
            Some(layer) => layer,
            None => self.innermost_layer(diagram, point)?,
        };
        let origin = self
            .store
            .layer(layer)
            .map(Layer::origin)
            .ok_or_else(|| SchemataError::not_found(layer))?;
        let id = self.store.ids().figure();
        self.store.insert(
            id,
            Figure {
                id,
                diagram,
                layer,
                object,
                kind,
                position: point.sub_point(origin),
                size,
                color,
                text,
            },
        );
        self.store.update::<Layer, _>(layer, |l| l.figures.push(id));
        self.store.update::<Diagram, _>(diagram, |d| d.figures.push(id));
        self.grow_layer_to_fit(layer, Bounds::new_from_top_left(point, size));
        debug!(figure:% = id, layer:% = layer; "Inserted figure");
        Ok(id)
    }
}
