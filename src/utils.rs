//! Raster helpers shared by the QR and caption renderers.

use image::{GrayImage, Luma};

use crate::{BACKGROUND, FOREGROUND};

/// Create a patch filled with the background value.
pub fn blank_patch(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([BACKGROUND]))
}

/// Mean pixel value of a grayscale raster, `BACKGROUND` for an empty one.
pub fn mean_intensity(img: &GrayImage) -> f64 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return BACKGROUND as f64;
    }
    let sum: u64 = img.pixels().map(|p| p.0[0] as u64).sum();
    sum as f64 / count as f64
}

/// Convert a grayscale raster to strictly two levels.
///
/// Pixels brighter than `threshold` become background, everything else ink.
pub fn step_filter(img: &mut GrayImage, threshold: u8) {
    for pixel in img.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > threshold {
            BACKGROUND
        } else {
            FOREGROUND
        };
    }
}
