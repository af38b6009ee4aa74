//! QR Label Sheet Generator
//!
//! This crate renders printable sheets of labels from tabular data. Every label
//! cell carries a QR code encoding the record's label text on its left half and
//! a human readable caption on its right half. Cells are tiled row-major onto
//! grayscale sheets sized for adhesive label stock.
//!
//! # Example
//!
//! ```rust,no_run
//! use qr_label_sheets::{load_records, Compositor, LabelRenderer, LayoutConfig};
//!
//! let config = LayoutConfig::default().grid(12, 4).qr_size(500);
//! let records =
//!     load_records("labels.csv", config.label_column(), config.description_column()).unwrap();
//! let compositor = Compositor::new(&config, LabelRenderer::new(&config)).unwrap();
//! for sheet in compositor.sheets(&records) {
//!     sheet.save("out").unwrap();
//! }
//! ```

mod caption;
mod compositor;
mod config;
mod error;
mod layout;
mod qr;
mod records;
mod utils;

pub use crate::{
    caption::{caption_lines, display_text, render_caption, CaptionFont},
    compositor::{compose, CellRenderer, Compositor, LabelRenderer, Sheet},
    config::LayoutConfig,
    error::{CellError, Error, FontError},
    layout::{CellRegions, GridPosition, Rect},
    qr::render_qr,
    records::{load_records, read_records, Record},
    utils::{blank_patch, mean_intensity, step_filter},
};

pub use qrcode::EcLevel;

/// Grayscale raster produced by a renderer and blitted onto a sheet.
///
/// Patches are transient: they are rendered for one cell, copied into the
/// sheet canvas and dropped.
pub type Patch = image::GrayImage;

/// Pixel value of the paper.
pub const BACKGROUND: u8 = 255;

/// Pixel value of printed ink.
pub const FOREGROUND: u8 = 0;
