//! Grid to screen mapping.

use blockfall_config::{BoardSettings, LayoutSettings};
use blockfall_types::{GridPos, Point};

/// Screen geometry of the board in abstract units.
///
/// Row 0 is drawn at the top; new blocks fly in from just below the last row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    columns: usize,
    rows: usize,
    cell_size: f32,
    column_margin: f32,
}

impl BoardLayout {
    #[must_use]
    pub const fn new(columns: usize, rows: usize, cell_size: f32, column_margin: f32) -> Self {
        Self {
            columns,
            rows,
            cell_size,
            column_margin,
        }
    }

    #[must_use]
    pub fn from_settings(board: &BoardSettings, layout: &LayoutSettings) -> Self {
        Self::new(board.columns, board.rows, layout.cell_size, layout.column_margin)
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Horizontal pitch: a cell plus a margin on either side.
    #[must_use]
    pub fn column_size(&self) -> f32 {
        self.cell_size + 2.0 * self.column_margin
    }

    /// Vertical pitch: a cell plus one margin.
    #[must_use]
    pub fn row_size(&self) -> f32 {
        self.cell_size + self.column_margin
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.column_size()
    }

    /// Board height including the spawn row below the last row.
    #[must_use]
    pub fn height(&self) -> f32 {
        (self.rows + 1) as f32 * self.row_size()
    }

    #[must_use]
    pub fn resting(&self, pos: GridPos) -> Point {
        Point::new(
            pos.column as f32 * self.column_size() + self.column_margin,
            pos.row as f32 * self.row_size(),
        )
    }

    /// Off-board start of a placement into `column`.
    #[must_use]
    pub fn spawn_point(&self, column: usize) -> Point {
        Point::new(
            column as f32 * self.column_size() + self.column_margin,
            self.rows as f32 * self.row_size(),
        )
    }

    /// Column under the horizontal screen coordinate `x`, if any.
    #[must_use]
    pub fn column_at(&self, x: f32) -> Option<usize> {
        if !x.is_finite() || x < 0.0 {
            return None;
        }
        let column = (x / self.column_size()) as usize;
        (column < self.columns).then_some(column)
    }
}
