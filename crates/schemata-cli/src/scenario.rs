//! TOML scenarios replayed against a [`Workspace`].
//!
//! A scenario is a list of `[[step]]` tables tagged by `op`. Steps that
//! create something may bind it to a handle (`id = "orders"`); later steps
//! refer to entities by handle. Prompt answers are taken from the top-level
//! `answers` list in order, falling back to `yes`.
//!
//! ```toml
//! answers = ["yes"]
//!
//! [[step]]
//! op = "create_model"
//! id = "shop"
//! name = "shop"
//! ```

use std::collections::HashMap;

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use schemata::{
    SchemataError, Workspace, WorkspaceBuilder,
    catalog::{Column, ColumnPair},
    clipboard::Clipboard,
    config::AppConfig,
    deletion::Target,
    diagram::Element,
    geometry::{Bounds, Point},
    identifier::{DiagramId, FigureId, LayerId, ModelId, ObjectId},
    kind::FigureKind,
    placement::{PlaceOptions, Placed, Subject},
    prompt::{Answer, ScriptedPrompt},
};

/// Scenario-level errors
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to parse scenario: {0}")]
    Parse(String),

    #[error("Unknown handle `{0}`")]
    UnknownHandle(String),

    #[error("Handle `{name}` does not name a {expected}")]
    WrongHandle { name: String, expected: &'static str },

    #[error("Unknown clipboard `{0}`")]
    UnknownClipboard(String),

    #[error("Step {step}: {message}")]
    Invalid { step: usize, message: String },
}

impl From<ScenarioError> for SchemataError {
    fn from(err: ScenarioError) -> Self {
        SchemataError::InvalidOperation(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub answers: Vec<Answer>,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parses a scenario from TOML source.
    pub fn parse(source: &str) -> Result<Self, ScenarioError> {
        toml::from_str(source).map_err(|e| ScenarioError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub not_null: bool,
}

impl From<&ColumnSpec> for Column {
    fn from(spec: &ColumnSpec) -> Self {
        let column = Column::new(spec.name.clone(), spec.data_type.clone());
        if spec.not_null { column.not_null() } else { column }
    }
}

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    CreateModel {
        id: Option<String>,
        name: String,
    },
    CreateDiagram {
        id: Option<String>,
        model: String,
        name: String,
    },
    CreateSchema {
        id: Option<String>,
        model: String,
        name: String,
    },
    CreateTable {
        id: Option<String>,
        schema: String,
        name: String,
        #[serde(default)]
        columns: Vec<ColumnSpec>,
    },
    CreateView {
        id: Option<String>,
        schema: String,
        name: String,
        #[serde(default)]
        query: String,
    },
    CreateRoutine {
        id: Option<String>,
        schema: String,
        name: String,
        #[serde(default)]
        language: String,
        #[serde(default)]
        body: String,
    },
    CreateRoutineGroup {
        id: Option<String>,
        schema: String,
        name: String,
    },
    AddToGroup {
        group: String,
        routine: String,
    },
    AddColumn {
        table: String,
        column: ColumnSpec,
    },
    CreateForeignKey {
        id: Option<String>,
        table: String,
        name: String,
        target: Option<String>,
        #[serde(default)]
        columns: Vec<[String; 2]>,
    },
    SetForeignKeyTarget {
        foreign_key: String,
        target: Option<String>,
    },
    Rename {
        object: String,
        name: String,
    },
    Place {
        id: Option<String>,
        diagram: String,
        kind: Option<FigureKind>,
        object: Option<String>,
        x: f32,
        y: f32,
        name: Option<String>,
        text: Option<String>,
    },
    AddLayer {
        id: Option<String>,
        diagram: String,
        name: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    MoveFigure {
        figure: String,
        x: f32,
        y: f32,
    },
    MoveLayer {
        layer: String,
        dx: f32,
        dy: f32,
    },
    ResizeLayer {
        layer: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Select {
        diagram: String,
        elements: Vec<String>,
    },
    Copy {
        diagram: String,
        clipboard: String,
    },
    Cut {
        diagram: String,
        clipboard: String,
    },
    Paste {
        diagram: String,
        clipboard: String,
        /// Handles bound to the pasted figures, in order.
        #[serde(default)]
        ids: Vec<String>,
    },
    Delete {
        target: String,
        #[serde(default)]
        figure_only: bool,
    },
    DeleteConnection {
        diagram: String,
        foreign_key: String,
    },
    DeleteSelection {
        diagram: String,
        #[serde(default)]
        figure_only: bool,
    },
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy)]
enum Handle {
    Model(ModelId),
    Diagram(DiagramId),
    Object(ObjectId),
    Figure(FigureId),
    Layer(LayerId),
}

/// Replays scenarios against one workspace.
pub struct Runner {
    workspace: Workspace,
    handles: HashMap<String, Handle>,
    clipboards: HashMap<String, Clipboard>,
    cancelled: usize,
}

impl Runner {
    /// Creates a runner whose prompt replies with `answers`.
    pub fn new(config: AppConfig, answers: &[Answer]) -> Self {
        let workspace = WorkspaceBuilder::new(config)
            .with_prompt(ScriptedPrompt::new(answers.iter().copied()))
            .build();
        Self {
            workspace,
            handles: HashMap::new(),
            clipboards: HashMap::new(),
            cancelled: 0,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Drains the workspace status log.
    pub fn take_status(&mut self) -> Vec<String> {
        self.workspace.take_status()
    }

    /// Number of steps the user cancelled.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    /// Runs every step in order.
    ///
    /// A cancelled confirmation only skips its step; any other failure
    /// stops the scenario.
    ///
    /// # Errors
    ///
    /// Returns the first non-cancellation error.
    pub fn run(&mut self, scenario: &Scenario) -> Result<(), SchemataError> {
        info!(steps = scenario.steps.len(); "Running scenario");
        for (index, step) in scenario.steps.iter().enumerate() {
            debug!(step = index + 1, action:? = step; "Step");
            match self.step(index + 1, step) {
                Ok(()) => {}
                Err(SchemataError::UserCancelled) => {
                    warn!(step = index + 1; "Step cancelled");
                    self.cancelled += 1;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn step(&mut self, index: usize, step: &Step) -> Result<(), SchemataError> {
        match step {
            Step::CreateModel { id, name } => {
                let model = self.workspace.create_model(name)?;
                self.bind(id, Handle::Model(model));
            }
            Step::CreateDiagram { id, model, name } => {
                let model = self.model(model)?;
                let diagram = self.workspace.create_diagram(model, name)?;
                self.bind(id, Handle::Diagram(diagram));
            }
            Step::CreateSchema { id, model, name } => {
                let model = self.model(model)?;
                let schema = self.workspace.create_schema(model, name)?;
                self.bind(id, Handle::Object(schema));
            }
            Step::CreateTable {
                id,
                schema,
                name,
                columns,
            } => {
                let schema = self.object(schema)?;
                let columns = columns.iter().map(Column::from).collect();
                let table = self.workspace.create_table(schema, name, columns)?;
                self.bind(id, Handle::Object(table));
            }
            Step::CreateView {
                id,
                schema,
                name,
                query,
            } => {
                let schema = self.object(schema)?;
                let view = self.workspace.create_view(schema, name, query)?;
                self.bind(id, Handle::Object(view));
            }
            Step::CreateRoutine {
                id,
                schema,
                name,
                language,
                body,
            } => {
                let schema = self.object(schema)?;
                let routine = self.workspace.create_routine(schema, name, language, body)?;
                self.bind(id, Handle::Object(routine));
            }
            Step::CreateRoutineGroup { id, schema, name } => {
                let schema = self.object(schema)?;
                let group = self.workspace.create_routine_group(schema, name)?;
                self.bind(id, Handle::Object(group));
            }
            Step::AddToGroup { group, routine } => {
                let (group, routine) = (self.object(group)?, self.object(routine)?);
                self.workspace.add_routine_to_group(group, routine)?;
            }
            Step::AddColumn { table, column } => {
                let table = self.object(table)?;
                self.workspace.add_column(table, column.into())?;
            }
            Step::CreateForeignKey {
                id,
                table,
                name,
                target,
                columns,
            } => {
                let table = self.object(table)?;
                let target = target.as_deref().map(|t| self.object(t)).transpose()?;
                let pairs = columns
                    .iter()
                    .map(|[local, referenced]| ColumnPair::new(local.clone(), referenced.clone()))
                    .collect();
                let fk = self.workspace.create_foreign_key(table, name, target, pairs)?;
                self.bind(id, Handle::Object(fk));
            }
            Step::SetForeignKeyTarget {
                foreign_key,
                target,
            } => {
                let fk = self.object(foreign_key)?;
                let target = target.as_deref().map(|t| self.object(t)).transpose()?;
                self.workspace.set_foreign_key_target(fk, target)?;
            }
            Step::Rename { object, name } => {
                let object = self.object(object)?;
                self.workspace.rename(object, name)?;
            }
            Step::Place {
                id,
                diagram,
                kind,
                object,
                x,
                y,
                name,
                text,
            } => {
                let diagram = self.diagram(diagram)?;
                let subject = match (object, kind) {
                    (Some(object), _) => Subject::Object(self.object(object)?),
                    (None, Some(kind)) => Subject::Kind(*kind),
                    (None, None) => {
                        return Err(ScenarioError::Invalid {
                            step: index,
                            message: "place needs a `kind` or an `object`".to_string(),
                        }
                        .into());
                    }
                };
                let options = PlaceOptions {
                    name: name.clone(),
                    text: text.clone(),
                    ..PlaceOptions::default()
                };
                let placed = self
                    .workspace
                    .place(diagram, Point::new(*x, *y), subject, options)?;
                match placed {
                    Placed::Figure { figure, .. } => self.bind(id, Handle::Figure(figure)),
                    Placed::Layer(layer) => self.bind(id, Handle::Layer(layer)),
                }
            }
            Step::AddLayer {
                id,
                diagram,
                name,
                x,
                y,
                width,
                height,
            } => {
                let diagram = self.diagram(diagram)?;
                let layer = self
                    .workspace
                    .add_layer(diagram, Bounds::from_rect(*x, *y, *width, *height), name)?;
                self.bind(id, Handle::Layer(layer));
            }
            Step::MoveFigure { figure, x, y } => {
                let figure = self.figure(figure)?;
                self.workspace.move_figure(figure, Point::new(*x, *y))?;
            }
            Step::MoveLayer { layer, dx, dy } => {
                let layer = self.layer(layer)?;
                self.workspace.move_layer(layer, Point::new(*dx, *dy))?;
            }
            Step::ResizeLayer {
                layer,
                x,
                y,
                width,
                height,
            } => {
                let layer = self.layer(layer)?;
                self.workspace
                    .resize_layer(layer, Bounds::from_rect(*x, *y, *width, *height))?;
            }
            Step::Select { diagram, elements } => {
                let diagram = self.diagram(diagram)?;
                let elements = elements
                    .iter()
                    .map(|name| self.element(name))
                    .collect::<Result<Vec<_>, _>>()?;
                self.workspace.select(diagram, &elements)?;
            }
            Step::Copy { diagram, clipboard } => {
                let diagram = self.diagram(diagram)?;
                let copied = self.workspace.copy(diagram)?;
                self.clipboards.insert(clipboard.clone(), copied);
            }
            Step::Cut { diagram, clipboard } => {
                let diagram = self.diagram(diagram)?;
                let copied = self.workspace.cut(diagram)?;
                self.clipboards.insert(clipboard.clone(), copied);
            }
            Step::Paste {
                diagram,
                clipboard,
                ids,
            } => {
                let diagram = self.diagram(diagram)?;
                let source = self
                    .clipboards
                    .get(clipboard)
                    .ok_or_else(|| ScenarioError::UnknownClipboard(clipboard.clone()))?;
                let figures = self.workspace.paste(diagram, source)?;
                for (name, figure) in ids.iter().zip(figures) {
                    self.handles.insert(name.clone(), Handle::Figure(figure));
                }
            }
            Step::Delete {
                target,
                figure_only,
            } => {
                let target = match self.lookup(target)? {
                    Handle::Object(id) => Target::Object(id),
                    Handle::Figure(id) => Target::Figure(id),
                    Handle::Layer(id) => Target::Layer(id),
                    Handle::Model(_) | Handle::Diagram(_) => {
                        return Err(ScenarioError::WrongHandle {
                            name: target.clone(),
                            expected: "deletable element",
                        }
                        .into());
                    }
                };
                self.workspace.delete(target, *figure_only)?;
            }
            Step::DeleteConnection {
                diagram,
                foreign_key,
            } => {
                let diagram = self.diagram(diagram)?;
                let fk = self.object(foreign_key)?;
                let connection = self
                    .workspace
                    .store()
                    .connections_for(diagram, fk)
                    .first()
                    .copied()
                    .ok_or_else(|| ScenarioError::Invalid {
                        step: index,
                        message: format!("`{foreign_key}` has no connection in the diagram"),
                    })?;
                self.workspace.delete(Target::Connection(connection), false)?;
            }
            Step::DeleteSelection {
                diagram,
                figure_only,
            } => {
                let diagram = self.diagram(diagram)?;
                self.workspace.delete_selection(diagram, *figure_only)?;
            }
            Step::Undo => {
                self.workspace.undo()?;
            }
            Step::Redo => {
                self.workspace.redo()?;
            }
        }
        Ok(())
    }

    fn bind(&mut self, id: &Option<String>, handle: Handle) {
        if let Some(name) = id {
            self.handles.insert(name.clone(), handle);
        }
    }

    fn lookup(&self, name: &str) -> Result<Handle, ScenarioError> {
        self.handles
            .get(name)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownHandle(name.to_string()))
    }

    fn wrong(name: &str, expected: &'static str) -> ScenarioError {
        ScenarioError::WrongHandle {
            name: name.to_string(),
            expected,
        }
    }

    fn model(&self, name: &str) -> Result<ModelId, ScenarioError> {
        match self.lookup(name)? {
            Handle::Model(id) => Ok(id),
            _ => Err(Self::wrong(name, "model")),
        }
    }

    fn diagram(&self, name: &str) -> Result<DiagramId, ScenarioError> {
        match self.lookup(name)? {
            Handle::Diagram(id) => Ok(id),
            _ => Err(Self::wrong(name, "diagram")),
        }
    }

    fn object(&self, name: &str) -> Result<ObjectId, ScenarioError> {
        match self.lookup(name)? {
            Handle::Object(id) => Ok(id),
            _ => Err(Self::wrong(name, "catalog object")),
        }
    }

    fn figure(&self, name: &str) -> Result<FigureId, ScenarioError> {
        match self.lookup(name)? {
            Handle::Figure(id) => Ok(id),
            _ => Err(Self::wrong(name, "figure")),
        }
    }

    fn layer(&self, name: &str) -> Result<LayerId, ScenarioError> {
        match self.lookup(name)? {
            Handle::Layer(id) => Ok(id),
            _ => Err(Self::wrong(name, "layer")),
        }
    }

    fn element(&self, name: &str) -> Result<Element, ScenarioError> {
        match self.lookup(name)? {
            Handle::Figure(id) => Ok(Element::Figure(id)),
            Handle::Layer(id) => Ok(Element::Layer(id)),
            _ => Err(Self::wrong(name, "figure or layer")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = r#"
        [[step]]
        op = "create_model"
        id = "shop"
        name = "shop"

        [[step]]
        op = "create_diagram"
        id = "main"
        model = "shop"
        name = "main"

        [[step]]
        op = "create_schema"
        id = "public"
        model = "shop"
        name = "public"

        [[step]]
        op = "create_table"
        id = "orders"
        schema = "public"
        name = "orders"
        columns = [{ name = "id", type = "int", not_null = true }]
    "#;

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::parse(SHOP).unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert!(scenario.answers.is_empty());
        assert!(matches!(scenario.steps[3], Step::CreateTable { ref columns, .. } if columns.len() == 1));
    }

    #[test]
    fn test_parse_error() {
        let err = Scenario::parse("[[step]]\nop = \"explode\"\n").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_run_binds_handles() {
        let scenario = Scenario::parse(SHOP).unwrap();
        let mut runner = Runner::new(AppConfig::default(), &scenario.answers);
        runner.run(&scenario).unwrap();

        let orders = runner.object("orders").unwrap();
        let table = runner.workspace().store().object(orders).unwrap();
        assert_eq!(table.name, "orders");
        assert!(runner.model("orders").is_err());
    }

    #[test]
    fn test_unknown_handle_stops_run() {
        let source = format!("{SHOP}\n[[step]]\nop = \"rename\"\nobject = \"nope\"\nname = \"x\"\n");
        let scenario = Scenario::parse(&source).unwrap();
        let mut runner = Runner::new(AppConfig::default(), &scenario.answers);

        let err = runner.run(&scenario).unwrap_err();
        assert_eq!(err.to_string(), "invalid operation: Unknown handle `nope`");
    }

    #[test]
    fn test_cancelled_step_continues() {
        let source = format!(
            r#"answers = ["cancel"]
            {SHOP}
            [[step]]
            op = "place"
            id = "f1"
            diagram = "main"
            object = "orders"
            x = 0.0
            y = 0.0

            [[step]]
            op = "place"
            diagram = "main"
            object = "orders"
            x = 200.0
            y = 0.0

            [[step]]
            op = "rename"
            object = "orders"
            name = "purchases"
            "#
        );
        let scenario = Scenario::parse(&source).unwrap();
        let mut runner = Runner::new(AppConfig::default(), &scenario.answers);
        runner.run(&scenario).unwrap();

        assert_eq!(runner.cancelled(), 1);
        let orders = runner.object("orders").unwrap();
        assert_eq!(runner.workspace().store().object(orders).unwrap().name, "purchases");
    }
}
