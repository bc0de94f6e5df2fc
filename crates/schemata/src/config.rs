//! Configuration types for the Schemata engine.
//!
//! All types implement [`serde::Deserialize`] so a front end can load them
//! from TOML or any other serde format; every section falls back to its
//! defaults when omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`ToolConfig`] - Per-tool defaults for newly placed objects (color,
//!   engine, schema, name prefix, size).
//! - [`CanvasConfig`] - Grid size, paste offset and layer growth margin.
//! - [`UndoConfig`] - Undo stack limit.
//!
//! # Example
//!
//! ```
//! # use schemata::config::AppConfig;
//! # use schemata_core::kind::FigureKind;
//! let config = AppConfig::default();
//! assert_eq!(config.tool(FigureKind::Table).name_prefix(), "table");
//! assert!(config.canvas().grid_size() > 0.0);
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use schemata_core::{color::Color, geometry::Size, kind::FigureKind};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Per-tool overrides keyed by figure kind (`[tools.table]`).
    #[serde(default)]
    tools: BTreeMap<FigureKind, ToolConfig>,

    #[serde(default)]
    canvas: CanvasConfig,

    #[serde(default)]
    undo: UndoConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(canvas: CanvasConfig, undo: UndoConfig) -> Self {
        Self {
            tools: BTreeMap::new(),
            canvas,
            undo,
        }
    }

    /// Returns the effective tool configuration for `kind`.
    ///
    /// Fields missing from the configured override fall back to the built-in
    /// defaults for that kind.
    pub fn tool(&self, kind: FigureKind) -> ToolConfig {
        let defaults = ToolConfig::default_for(kind);
        match self.tools.get(&kind) {
            Some(configured) => configured.clone().or(defaults),
            None => defaults,
        }
    }

    /// Replaces the tool configuration for `kind`.
    pub fn set_tool(&mut self, kind: FigureKind, tool: ToolConfig) {
        self.tools.insert(kind, tool);
    }

    /// Returns the canvas configuration.
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Returns the undo configuration.
    pub fn undo(&self) -> &UndoConfig {
        &self.undo
    }

    /// Checks every configured color.
    ///
    /// # Errors
    ///
    /// Returns a description of the first color string that does not parse.
    pub fn validate(&self) -> Result<(), String> {
        for (kind, tool) in &self.tools {
            tool.color()
                .map_err(|err| format!("invalid color for the {kind} tool: {err}"))?;
        }
        Ok(())
    }
}

/// Defaults applied by a placement tool to the objects it creates.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolConfig {
    /// Figure color as a CSS color string.
    #[serde(default)]
    color: Option<String>,

    /// Storage engine assigned to new tables.
    #[serde(default)]
    engine: Option<String>,

    /// Schema new objects are created in.
    #[serde(default)]
    schema: Option<String>,

    /// Prefix of generated names (`table` gives `table_1`, `table_2`, ...).
    #[serde(default)]
    name_prefix: Option<String>,

    #[serde(default)]
    width: Option<f32>,

    #[serde(default)]
    height: Option<f32>,
}

impl ToolConfig {
    /// Returns the built-in defaults for `kind`.
    pub fn default_for(kind: FigureKind) -> Self {
        let (color, width, height) = match kind {
            FigureKind::Table => ("#dce8f5", 160.0, 60.0),
            FigureKind::View => ("#e3f1de", 160.0, 60.0),
            FigureKind::RoutineGroup => ("#f6ecd8", 160.0, 80.0),
            FigureKind::Note => ("#fff8b0", 140.0, 80.0),
            FigureKind::Image => ("#ffffff", 120.0, 120.0),
            FigureKind::Layer => ("#c8d4e3", 300.0, 300.0),
            FigureKind::Routine | FigureKind::ForeignKey | FigureKind::Schema => {
                ("#eeeeee", 120.0, 40.0)
            }
        };
        let prefix = match kind {
            FigureKind::RoutineGroup => "routine_group",
            FigureKind::ForeignKey => "fk",
            other => other.name(),
        };
        Self {
            color: Some(color.to_string()),
            engine: None,
            schema: None,
            name_prefix: Some(prefix.to_string()),
            width: Some(width),
            height: Some(height),
        }
    }

    /// Fills every unset field from `fallback`.
    pub fn or(self, fallback: ToolConfig) -> Self {
        Self {
            color: self.color.or(fallback.color),
            engine: self.engine.or(fallback.engine),
            schema: self.schema.or(fallback.schema),
            name_prefix: self.name_prefix.or(fallback.name_prefix),
            width: self.width.or(fallback.width),
            height: self.height.or(fallback.height),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Returns the parsed [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn color(&self) -> Result<Option<Color>, String> {
        self.color.as_deref().map(Color::new).transpose()
    }

    pub fn engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Returns the name prefix, `object` when none is configured.
    pub fn name_prefix(&self) -> &str {
        self.name_prefix.as_deref().unwrap_or("object")
    }

    /// Returns the configured default size, if both dimensions are set.
    pub fn size(&self) -> Option<Size> {
        Some(Size::new(self.width?, self.height?))
    }
}

/// Canvas-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    /// Grid spacing figures snap to; `0` disables snapping.
    #[serde(default = "CanvasConfig::default_grid_size")]
    grid_size: f32,

    /// Offset added per paste into the same diagram.
    #[serde(default = "CanvasConfig::default_paste_offset")]
    paste_offset: f32,

    /// Margin kept between a grown layer's edge and the figure that grew it.
    #[serde(default = "CanvasConfig::default_layer_margin")]
    layer_margin: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            grid_size: Self::default_grid_size(),
            paste_offset: Self::default_paste_offset(),
            layer_margin: Self::default_layer_margin(),
        }
    }
}

impl CanvasConfig {
    pub fn new(grid_size: f32, paste_offset: f32, layer_margin: f32) -> Self {
        Self {
            grid_size,
            paste_offset,
            layer_margin,
        }
    }

    fn default_grid_size() -> f32 {
        10.0
    }

    fn default_paste_offset() -> f32 {
        20.0
    }

    fn default_layer_margin() -> f32 {
        10.0
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    pub fn paste_offset(&self) -> f32 {
        self.paste_offset
    }

    pub fn layer_margin(&self) -> f32 {
        self.layer_margin
    }
}

/// Undo stack settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UndoConfig {
    /// Maximum number of entries kept on the undo stack.
    #[serde(default = "UndoConfig::default_limit")]
    limit: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            limit: Self::default_limit(),
        }
    }
}

impl UndoConfig {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    fn default_limit() -> usize {
        200
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
