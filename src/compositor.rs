//! Sheet compositing.
//!
//! Records are split into pages of `rows * cols` cells. Each page gets a blank
//! canvas, every occupied cell gets a QR patch on its left half and a caption
//! patch on its right half, and patches are copied onto the canvas after a
//! bounds check against their cell. Failures stay inside the cell that caused
//! them.

use image::{GenericImage, GrayImage, ImageFormat};
use log::{debug, warn};
use qrcode::EcLevel;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::{
    caption::{render_caption, CaptionFont},
    config::LayoutConfig,
    error::{CellError, Error},
    layout::{CellRegions, Rect},
    qr::render_qr,
    records::Record,
    utils::blank_patch,
    Patch,
};

const SHEET_PREFIX: &str = "labels_sheet";

/// Produces the two patches of a label cell.
pub trait CellRenderer {
    /// QR patch of `size` x `size` pixels encoding `text`.
    fn render_qr(&self, text: &str, size: u32) -> Result<Patch, CellError>;

    /// Caption patch no larger than `size` x `size` pixels.
    fn render_caption(&self, label: &str, description: &str, size: u32)
        -> Result<Patch, CellError>;
}

/// Default cell renderer backed by the `qrcode` and `rusttype` crates.
#[derive(Debug)]
pub struct LabelRenderer {
    ec_level: EcLevel,
    font: CaptionFont,
}

impl LabelRenderer {
    /// Build a renderer from the layout's correction level and font path.
    ///
    /// A missing or unreadable font is not an error, captions then use the
    /// embedded stroke font.
    pub fn new(config: &LayoutConfig) -> Self {
        LabelRenderer {
            ec_level: config.get_ec_level(),
            font: CaptionFont::resolve(config.get_font_path()),
        }
    }

    pub fn with_font(ec_level: EcLevel, font: CaptionFont) -> Self {
        LabelRenderer { ec_level, font }
    }
}

impl CellRenderer for LabelRenderer {
    fn render_qr(&self, text: &str, size: u32) -> Result<Patch, CellError> {
        render_qr(text, size, self.ec_level)
    }

    fn render_caption(
        &self,
        label: &str,
        description: &str,
        size: u32,
    ) -> Result<Patch, CellError> {
        render_caption(label, description, size, &self.font)
    }
}

/// One composed label sheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    index: usize,
    image: GrayImage,
    populated: usize,
    failed: usize,
}

impl Sheet {
    fn blank(index: usize, width: u32, height: u32) -> Self {
        Sheet {
            index,
            image: blank_patch(width, height),
            populated: 0,
            failed: 0,
        }
    }

    /// 0-based position of the sheet in the run.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based sheet number used in file names.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Cells whose record was rendered and placed completely.
    pub fn populated(&self) -> usize {
        self.populated
    }

    /// Cells left blank or partial because of a cell error.
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.png", SHEET_PREFIX, self.number())
    }

    /// Encode the sheet as a grayscale PNG in memory.
    pub fn encode_png(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }

    /// Write the sheet into `dir` and return the file path.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, Error> {
        let path = dir.as_ref().join(self.file_name());
        fs::write(&path, self.encode_png()?)?;
        Ok(path)
    }
}

/// Lays records out on sheets.
pub struct Compositor<R> {
    config: LayoutConfig,
    renderer: R,
}

impl<R: CellRenderer> Compositor<R> {
    /// Fails with [`Error::InvalidConfig`] when the layout is inconsistent.
    pub fn new(config: &LayoutConfig, renderer: R) -> Result<Self, Error> {
        config.validate()?;
        Ok(Compositor {
            config: config.clone(),
            renderer,
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compose sheets lazily, one canvas at a time.
    pub fn sheets<'r>(&'r self, records: &'r [Record]) -> impl Iterator<Item = Sheet> + 'r {
        records
            .chunks(self.config.per_sheet())
            .enumerate()
            .map(move |(index, page)| self.compose_sheet(index, page))
    }

    /// Compose every sheet for `records`. Zero records give zero sheets.
    pub fn compose(&self, records: &[Record]) -> Vec<Sheet> {
        self.sheets(records).collect()
    }

    fn compose_sheet(&self, index: usize, page: &[Record]) -> Sheet {
        let (width, height) = self.config.sheet_dimensions();
        let mut sheet = Sheet::blank(index, width, height);
        let first = index * self.config.per_sheet();

        for (slot, record) in page.iter().enumerate() {
            let position = self.config.position_of(first + slot);
            let regions = self.config.cell_regions(position.row, position.col);
            match self.fill_cell(&mut sheet.image, record, &regions) {
                Ok(()) => sheet.populated += 1,
                Err(err) => {
                    warn!(
                        "Sheet {} cell ({}, {}) label {:?}: {}",
                        sheet.number(),
                        position.row,
                        position.col,
                        record.label(),
                        err
                    );
                    sheet.failed += 1;
                }
            }
        }

        debug!(
            "Sheet {}: {} populated, {} failed, {} blank",
            sheet.number(),
            sheet.populated,
            sheet.failed,
            self.config.per_sheet() - page.len()
        );
        sheet
    }

    /// Render and place both patches of one cell.
    ///
    /// A render error stops the cell where it is. A placement error skips
    /// that patch only, the other one is still placed.
    fn fill_cell(
        &self,
        canvas: &mut GrayImage,
        record: &Record,
        regions: &CellRegions,
    ) -> Result<(), CellError> {
        let size = self.config.get_qr_size();

        let qr = self.renderer.render_qr(record.label(), size)?;
        let qr_placed = blit(canvas, &qr, regions.qr.x, regions.qr.y, &regions.cell);

        let caption = self
            .renderer
            .render_caption(record.label(), record.description(), size)?;
        let caption_placed = blit(
            canvas,
            &caption,
            regions.caption.x,
            regions.caption.y,
            &regions.cell,
        );

        qr_placed.and(caption_placed)
    }
}

/// Compose `records` with the default [`LabelRenderer`].
pub fn compose(records: &[Record], config: &LayoutConfig) -> Result<Vec<Sheet>, Error> {
    let compositor = Compositor::new(config, LabelRenderer::new(config))?;
    Ok(compositor.compose(records))
}

/// Copy `patch` onto `canvas` at `(x, y)` if it lies inside `bounds`.
fn blit(
    canvas: &mut GrayImage,
    patch: &Patch,
    x: u32,
    y: u32,
    bounds: &Rect,
) -> Result<(), CellError> {
    let target = Rect::new(x, y, patch.width(), patch.height());
    if !bounds.contains(&target)
        || target.right() > canvas.width() as u64
        || target.bottom() > canvas.height() as u64
    {
        return Err(CellError::PlacementBounds {
            x,
            y,
            width: target.width,
            height: target.height,
            bounds_x: bounds.x,
            bounds_y: bounds.y,
            bounds_width: bounds.width,
            bounds_height: bounds.height,
        });
    }
    canvas.copy_from(patch, x, y)?;
    Ok(())
}
