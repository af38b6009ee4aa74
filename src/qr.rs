//! QR code patches.

use image::imageops::{self, FilterType};
use image::Luma;
use log::{debug, warn};
use qrcode::{EcLevel, QrCode};

use crate::{
    error::CellError,
    utils::{blank_patch, mean_intensity, step_filter},
    Patch, BACKGROUND, FOREGROUND,
};

/// Modules of light border on each side of a rendered symbol.
const QUIET_ZONE: u32 = 4;

/// Render `text` as a `size` x `size` QR code patch.
///
/// The smallest symbol version that holds `text` at `ec_level` is chosen. Text
/// too long for the largest version is an error, never truncated. Empty text
/// gives a blank patch. The result is strictly two-valued, dark modules on a
/// light background, with the standard quiet zone kept around the symbol.
pub fn render_qr(text: &str, size: u32, ec_level: EcLevel) -> Result<Patch, CellError> {
    if text.is_empty() || size == 0 {
        return Ok(blank_patch(size, size));
    }

    let code = QrCode::with_error_correction_level(text.as_bytes(), ec_level)?;
    debug!(
        "QR {:?}: version {:?}, {} modules",
        text,
        code.version(),
        code.width()
    );
    if !fits(&code, size) {
        warn!(
            "QR {:?} needs {} px but the patch is {} px, modules will be dropped",
            text,
            min_size(&code),
            size
        );
    }

    let symbol = code
        .render::<Luma<u8>>()
        .dark_color(Luma([FOREGROUND]))
        .light_color(Luma([BACKGROUND]))
        .quiet_zone(true)
        .max_dimensions(size, size)
        .build();

    let mut patch = if symbol.dimensions() == (size, size) {
        symbol
    } else {
        imageops::resize(&symbol, size, size, FilterType::Nearest)
    };
    normalize_polarity(&mut patch);
    Ok(patch)
}

/// Smallest patch side that gives every module at least one pixel.
fn min_size(code: &QrCode) -> u32 {
    code.width() as u32 + 2 * QUIET_ZONE
}

fn fits(code: &QrCode, size: u32) -> bool {
    min_size(code) <= size
}

/// Force the patch to two levels with the light value in the majority.
///
/// A QR symbol with its quiet zone is mostly background, so a dark mean means
/// the colors came out swapped.
fn normalize_polarity(patch: &mut Patch) {
    step_filter(patch, 127);
    if mean_intensity(patch) < 128.0 {
        debug!("QR patch came out inverted, flipping");
        imageops::invert(patch);
    }
}
