//! Read-only canvas geometry consumed by placement.

use schemata_core::{catalog::CatalogObject, geometry::Point, geometry::Size, kind::FigureKind};

/// Height of a table figure's title row.
const TABLE_HEADER_HEIGHT: f32 = 30.0;
/// Height of one column row in a table figure.
const TABLE_ROW_HEIGHT: f32 = 18.0;

/// Geometry services of the drawing surface.
pub trait Canvas {
    /// Snaps an absolute point to the canvas grid.
    fn snap(&self, point: Point) -> Point;

    /// Returns the size a new figure of `kind` should get.
    ///
    /// `configured` is the tool's configured default size, `object` the
    /// catalog object the figure will show.
    fn figure_size(
        &self,
        kind: FigureKind,
        object: Option<&CatalogObject>,
        configured: Option<Size>,
    ) -> Size;
}

/// Canvas with a uniform square grid.
#[derive(Debug, Clone, Copy)]
pub struct GridCanvas {
    grid_size: f32,
}

impl GridCanvas {
    /// Creates a canvas; a grid size of `0` disables snapping.
    pub fn new(grid_size: f32) -> Self {
        Self { grid_size }
    }
}

impl Canvas for GridCanvas {
    fn snap(&self, point: Point) -> Point {
        point.snap(self.grid_size)
    }

    fn figure_size(
        &self,
        kind: FigureKind,
        object: Option<&CatalogObject>,
        configured: Option<Size>,
    ) -> Size {
        let base = configured.unwrap_or(Size::new(120.0, 40.0));
        match (kind, object.and_then(CatalogObject::as_table)) {
            (FigureKind::Table, Some(table)) => {
                let rows = table.columns.len() as f32;
                base.max(Size::new(0.0, TABLE_HEADER_HEIGHT + rows * TABLE_ROW_HEIGHT))
            }
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use schemata_core::{
        catalog::{Column, ObjectBody, Table},
        identifier::{ModelId, ObjectId},
    };

    use super::*;

    #[test]
    fn test_snap_to_grid() {
        let canvas = GridCanvas::new(10.0);
        assert_eq!(canvas.snap(Point::new(54.0, 47.0)), Point::new(50.0, 50.0));
        assert_eq!(GridCanvas::new(0.0).snap(Point::new(3.3, 4.4)), Point::new(3.3, 4.4));
    }

    #[test]
    fn test_table_grows_with_columns() {
        let canvas = GridCanvas::new(10.0);
        let columns = (0..5).map(|i| Column::new(format!("c{i}"), "integer")).collect();
        let object = CatalogObject::new(
            ObjectId::from_raw(1),
            ModelId::from_raw(1),
            None,
            "wide",
            ObjectBody::Table(Table::with_columns(columns)),
        );

        let size = canvas.figure_size(FigureKind::Table, Some(&object), Some(Size::new(160.0, 60.0)));
        assert_approx_eq!(f32, size.width(), 160.0);
        assert_approx_eq!(f32, size.height(), 120.0);

        let empty = canvas.figure_size(FigureKind::Note, None, Some(Size::new(140.0, 80.0)));
        assert_eq!(empty, Size::new(140.0, 80.0));
    }
}
