use log::debug;
use qrcode::EcLevel;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Layout of a label sheet.
///
/// The configuration is an immutable value passed through the whole pipeline.
/// Builder methods consume the value and return a modified copy.
///
/// # Example
///
/// ```
/// use qr_label_sheets::LayoutConfig;
///
/// let config = LayoutConfig::default()
///     .grid(10, 3)
///     .cell_size(1200, 500)
///     .qr_size(400)
///     .columns("sku", "name");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    rows: u32,
    cols: u32,
    cell_width: u32,
    cell_height: u32,
    qr_size: u32,
    label_column: String,
    description_column: String,
    font_path: Option<PathBuf>,
    ec_level: EcLevel,
}

impl Default for LayoutConfig {
    /// 12 x 4 sheet of 1400 x 600 px cells with 500 px QR codes.
    fn default() -> Self {
        LayoutConfig {
            rows: 12,
            cols: 4,
            cell_width: 1400,
            cell_height: 600,
            qr_size: 500,
            label_column: "label".to_string(),
            description_column: "description".to_string(),
            font_path: None,
            ec_level: EcLevel::H,
        }
    }
}

impl LayoutConfig {
    pub fn grid(self, rows: u32, cols: u32) -> Self {
        LayoutConfig { rows, cols, ..self }
    }

    /// Set the pixel size of one label cell.
    pub fn cell_size(self, cell_width: u32, cell_height: u32) -> Self {
        LayoutConfig {
            cell_width,
            cell_height,
            ..self
        }
    }

    pub fn qr_size(self, qr_size: u32) -> Self {
        LayoutConfig { qr_size, ..self }
    }

    /// Set the column names holding the label and the description.
    pub fn columns(self, label: &str, description: &str) -> Self {
        LayoutConfig {
            label_column: label.to_string(),
            description_column: description.to_string(),
            ..self
        }
    }

    /// Use a TrueType/OpenType font file for captions.
    ///
    /// Without a font path captions are drawn with the embedded stroke font.
    pub fn font_path<P: Into<PathBuf>>(self, path: P) -> Self {
        LayoutConfig {
            font_path: Some(path.into()),
            ..self
        }
    }

    pub fn ec_level(self, ec_level: EcLevel) -> Self {
        LayoutConfig { ec_level, ..self }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    pub fn get_qr_size(&self) -> u32 {
        self.qr_size
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn description_column(&self) -> &str {
        &self.description_column
    }

    pub fn get_font_path(&self) -> Option<&Path> {
        self.font_path.as_deref()
    }

    pub fn get_ec_level(&self) -> EcLevel {
        self.ec_level
    }

    /// Check the layout invariants.
    ///
    /// The grid needs at least one row and one column, and the QR patch must
    /// fit the cell. The QR patch must also stay in the left half of the cell
    /// so it never overlaps the caption drawn from the cell's midpoint.
    pub fn validate(&self) -> Result<(), Error> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must have at least one row and one column, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.cell_width == 0 || self.cell_height == 0 || self.qr_size == 0 {
            return Err(Error::InvalidConfig(
                "cell and QR dimensions must be non-zero".to_string(),
            ));
        }
        if self.qr_size > self.cell_height || self.qr_size > self.cell_width {
            return Err(Error::InvalidConfig(format!(
                "QR size {} does not fit a {}x{} cell",
                self.qr_size, self.cell_width, self.cell_height
            )));
        }
        let margin = (self.cell_height - self.qr_size) / 2;
        if margin + self.qr_size > self.cell_width / 2 {
            return Err(Error::InvalidConfig(format!(
                "QR size {} with margin {} overlaps the caption half of a {} px wide cell",
                self.qr_size, margin, self.cell_width
            )));
        }
        if self.sheet_width().is_none() || self.sheet_height().is_none() {
            return Err(Error::InvalidConfig(format!(
                "sheet of {}x{} cells is too large",
                self.cols, self.rows
            )));
        }
        debug!("{:?}", self);
        Ok(())
    }

    pub(crate) fn sheet_width(&self) -> Option<u32> {
        self.cols.checked_mul(self.cell_width)
    }

    pub(crate) fn sheet_height(&self) -> Option<u32> {
        self.rows.checked_mul(self.cell_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rows(), 12);
        assert_eq!(config.cols(), 4);
        assert_eq!(config.label_column(), "label");
        assert_eq!(config.description_column(), "description");
        assert_eq!(config.get_ec_level(), EcLevel::H);
        assert!(config.get_font_path().is_none());
    }

    #[test]
    fn builder_keeps_untouched_fields() {
        let config = LayoutConfig::default().grid(2, 3).columns("sku", "name");
        assert_eq!(config.rows(), 2);
        assert_eq!(config.cols(), 3);
        assert_eq!(config.cell_width(), 1400);
        assert_eq!(config.get_qr_size(), 500);
        assert_eq!(config.label_column(), "sku");
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(matches!(
            LayoutConfig::default().grid(0, 4).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            LayoutConfig::default().grid(3, 0).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn qr_larger_than_cell_is_rejected() {
        let config = LayoutConfig::default().cell_size(1400, 400).qr_size(500);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn qr_reaching_into_caption_half_is_rejected() {
        // margin 50 + qr 500 > 1000 / 2
        let config = LayoutConfig::default().cell_size(1000, 600).qr_size(500);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn oversized_sheet_is_rejected() {
        let config = LayoutConfig::default()
            .grid(u32::MAX, 1)
            .cell_size(200, 100)
            .qr_size(40);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
