//! Error types for label sheet generation.
//!
//! Errors come in three tiers. [`Error`] is fatal and aborts the run before any
//! sheet is written. [`CellError`] is confined to a single label cell: it is
//! logged and the compositor moves on to the next cell. [`FontError`] is always
//! recovered by falling back to the embedded stroke font.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal error for a generation run.
#[derive(Error, Debug)]
pub enum Error {
    /// The input table is missing or could not be read.
    #[error("Can't read input table {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The input table has no column with the required label name.
    #[error("Input table is missing required column: {0}")]
    MissingColumn(String),

    /// Layout values are out of range or inconsistent with each other.
    #[error("Invalid layout configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Encoding or writing a sheet image failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Failure confined to one label cell.
///
/// None of these abort a sheet. The compositor logs them and leaves the cell
/// blank or partially drawn.
#[derive(Error, Debug)]
pub enum CellError {
    /// The label text could not be encoded, usually because it is too long for
    /// the largest symbol version at the configured correction level.
    #[error("Can't encode QR symbol: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Can't render caption: {0}")]
    Caption(String),

    /// Text metrics could not be computed for a caption line.
    #[error("Can't measure caption text {0:?}")]
    TextMetrics(String),

    /// A patch does not fit inside the cell it was rendered for.
    #[error(
        "Patch {width}x{height} at ({x}, {y}) exceeds cell bounds {bounds_width}x{bounds_height} at ({bounds_x}, {bounds_y})"
    )]
    PlacementBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        bounds_x: u32,
        bounds_y: u32,
        bounds_width: u32,
        bounds_height: u32,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Scalable font resource could not be used.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("No font path configured")]
    NotConfigured,

    #[error("Can't read font file {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Font file {0:?} is not a valid TrueType/OpenType font")]
    Invalid(PathBuf),
}
