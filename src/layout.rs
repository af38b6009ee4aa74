//! Grid geometry for label sheets.
//!
//! Everything here is pure arithmetic on a [`LayoutConfig`]. Record index `i`
//! lands on sheet `i / (rows * cols)` and, within that sheet, on cell
//! `(row, col) = ((i % per_sheet) / cols, (i % per_sheet) % cols)`.

use crate::config::LayoutConfig;

/// Axis aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        (self.x as u64) < other.right()
            && (other.x as u64) < self.right()
            && (self.y as u64) < other.bottom()
            && (other.y as u64) < self.bottom()
    }
}

/// Where a record lands: its sheet and its cell within that sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub sheet: usize,
    pub row: u32,
    pub col: u32,
}

/// Pixel regions of one cell on the sheet canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRegions {
    /// The whole cell.
    pub cell: Rect,
    /// QR patch target, vertically centered on the left.
    pub qr: Rect,
    /// Caption patch target, starting at the cell's horizontal midpoint.
    pub caption: Rect,
}

impl LayoutConfig {
    /// Number of cells on one sheet.
    pub fn per_sheet(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }

    /// Number of sheets needed for `records` records; zero for zero records.
    pub fn sheet_count(&self, records: usize) -> usize {
        let per_sheet = self.per_sheet();
        if per_sheet == 0 {
            return 0;
        }
        (records + per_sheet - 1) / per_sheet
    }

    /// Sheet canvas size as `(width, height)`, saturating at `u32::MAX` for
    /// layouts that [`LayoutConfig::validate`] rejects as too large.
    pub fn sheet_dimensions(&self) -> (u32, u32) {
        (
            self.sheet_width().unwrap_or(u32::MAX),
            self.sheet_height().unwrap_or(u32::MAX),
        )
    }

    /// Vertical centering margin of the QR patch inside its cell.
    pub fn margin(&self) -> u32 {
        self.cell_height().saturating_sub(self.get_qr_size()) / 2
    }

    /// Map a global record index to its sheet and cell.
    ///
    /// An empty grid is treated as a single cell, like `sheet_count` it never
    /// divides by zero.
    pub fn position_of(&self, index: usize) -> GridPosition {
        let per_sheet = self.per_sheet().max(1);
        let local = index % per_sheet;
        let cols = (self.cols() as usize).max(1);
        GridPosition {
            sheet: index / per_sheet,
            row: (local / cols) as u32,
            col: (local % cols) as u32,
        }
    }

    /// Pixel regions for the cell at `(row, col)` on a sheet canvas.
    pub fn cell_regions(&self, row: u32, col: u32) -> CellRegions {
        let cell_x = col.saturating_mul(self.cell_width());
        let cell_y = row.saturating_mul(self.cell_height());
        let margin = self.margin();
        let qr_size = self.get_qr_size();

        CellRegions {
            cell: Rect::new(cell_x, cell_y, self.cell_width(), self.cell_height()),
            qr: Rect::new(
                cell_x.saturating_add(margin),
                cell_y.saturating_add(margin),
                qr_size,
                qr_size,
            ),
            caption: Rect::new(
                cell_x.saturating_add(self.cell_width() / 2),
                cell_y.saturating_add(margin),
                qr_size,
                qr_size,
            ),
        }
    }
}
