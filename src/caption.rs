//! Caption patches: the human readable text printed next to each QR code.
//!
//! Captions are drawn with a scalable TrueType/OpenType font when one is
//! configured, otherwise with the embedded Hershey stroke font. Both paths
//! produce hard two-level ink so captions match the QR patch polarity.

use image::Luma;
use imageproc::drawing::draw_line_segment_mut;
use log::{debug, info, warn};
use rusttype::{point, Font, Scale};
use std::fmt;
use std::path::Path;
use vector_text::{render_text, HersheyFont, VectorFont};

use crate::{
    error::{CellError, FontError},
    utils::blank_patch,
    Patch, FOREGROUND,
};

/// Minimum distance between text and the patch edge.
const INSET: u32 = 10;
/// Vertical gap between caption lines.
const LINE_SPACING: u32 = 8;
const MIN_FONT_PX: u32 = 12;
const FONT_STEP: usize = 2;
/// Font size and chunk width used when caption metrics are unavailable.
const FIXED_FONT_PX: f32 = 24.0;
const FIXED_WRAP: usize = 10;
/// Glyph coverage above which a pixel is inked.
const INK_THRESHOLD: f32 = 0.5;
/// Longest text handed to the stroke font, whose glyph offsets are `i16`.
const MAX_STROKE_CHARS: usize = 512;

/// Text shown in a caption: the label, followed by the description if any.
pub fn display_text(label: &str, description: &str) -> String {
    if description.is_empty() {
        label.to_string()
    } else {
        format!("{} {}", label, description)
    }
}

/// Caption lines before wrapping: the label line, then the description line.
pub fn caption_lines(label: &str, description: &str) -> Vec<String> {
    [label, description]
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

/// Font used to draw captions.
pub enum CaptionFont {
    Scalable(Font<'static>),
    /// Embedded Hershey Roman Simplex, always available.
    Stroke,
}

impl fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalable(_) => write!(f, "CaptionFont::Scalable"),
            Self::Stroke => write!(f, "CaptionFont::Stroke"),
        }
    }
}

impl CaptionFont {
    /// Load a scalable font from a TrueType/OpenType file.
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Font::try_from_vec(bytes)
            .map(Self::Scalable)
            .ok_or_else(|| FontError::Invalid(path.to_path_buf()))
    }

    /// Load the configured font, falling back to the stroke font with a warning.
    pub fn resolve(path: Option<&Path>) -> Self {
        let font = match path {
            Some(path) => Self::load(path),
            None => Err(FontError::NotConfigured),
        };
        match font {
            Ok(font) => {
                info!("Using caption font {:?}", path);
                font
            }
            Err(err) => {
                warn!("{}, captions use the embedded stroke font", err);
                Self::Stroke
            }
        }
    }

    pub fn is_scalable(&self) -> bool {
        matches!(self, Self::Scalable(_))
    }

    fn line_height(&self, px: f32) -> u32 {
        match self {
            Self::Scalable(font) => {
                let vm = font.v_metrics(Scale::uniform(px));
                (vm.ascent - vm.descent).ceil().max(1.0) as u32
            }
            Self::Stroke => px.ceil().max(1.0) as u32,
        }
    }

    /// Pixel width of `text` drawn at `px`.
    fn measure(&self, text: &str, px: f32) -> Result<u32, CellError> {
        let width = match self {
            Self::Scalable(font) => {
                let scale = Scale::uniform(px);
                let ascent = font.v_metrics(scale).ascent;
                let glyphs: Vec<_> = font.layout(text, scale, point(0.0, ascent)).collect();
                glyphs
                    .iter()
                    .rev()
                    .find_map(|g| g.pixel_bounding_box().map(|bb| bb.max.x.max(0) as u32))
            }
            Self::Stroke => StrokeText::new(text, px).map(|s| s.width()),
        };
        width.ok_or_else(|| CellError::TextMetrics(text.to_string()))
    }

    /// Draw one line of text with its top-left corner at `(x, y)`.
    fn draw(&self, img: &mut Patch, text: &str, x: u32, y: u32, px: f32) {
        match self {
            Self::Scalable(font) => {
                let scale = Scale::uniform(px);
                let ascent = font.v_metrics(scale).ascent;
                let (w, h) = img.dimensions();
                for g in font.layout(text, scale, point(x as f32, y as f32 + ascent)) {
                    if let Some(bb) = g.pixel_bounding_box() {
                        g.draw(|gx, gy, v| {
                            if v > INK_THRESHOLD {
                                let ix = gx as i32 + bb.min.x;
                                let iy = gy as i32 + bb.min.y;
                                if ix >= 0 && iy >= 0 && (ix as u32) < w && (iy as u32) < h {
                                    img.put_pixel(ix as u32, iy as u32, Luma([FOREGROUND]));
                                }
                            }
                        });
                    }
                }
            }
            Self::Stroke => {
                if let Some(stroke) = StrokeText::new(text, px) {
                    stroke.draw(img, x, y);
                }
            }
        }
    }
}

/// A line of text laid out in the Hershey stroke font.
struct StrokeText {
    points: Vec<vector_text::Point>,
    scale: f32,
    min_x: i16,
    top: i16,
    weight: u32,
}

impl StrokeText {
    /// `None` when the font has no strokes for any character of `text`.
    fn new(text: &str, px: f32) -> Option<Self> {
        let text: String = text.chars().take(MAX_STROKE_CHARS).collect();
        let points = render_text(&text, VectorFont::HersheyFont(HersheyFont::Romans));
        let min_x = points.iter().map(|p| p.x).min()?;

        // Scale from the cap-to-descender extent so every line shares a baseline.
        let reference = render_text("Hg", VectorFont::HersheyFont(HersheyFont::Romans));
        let top = reference.iter().map(|p| p.y).min().unwrap_or(0);
        let bottom = reference.iter().map(|p| p.y).max().unwrap_or(1);
        let extent = (bottom - top).max(1) as f32;

        Some(StrokeText {
            points,
            scale: px / extent,
            min_x,
            top,
            weight: (px / 16.0).max(1.0) as u32,
        })
    }

    fn width(&self) -> u32 {
        let max_x = self.points.iter().map(|p| p.x).max().unwrap_or(self.min_x);
        ((max_x - self.min_x) as f32 * self.scale).ceil() as u32 + self.weight
    }

    fn draw(&self, img: &mut Patch, x: u32, y: u32) {
        let project = |p: &vector_text::Point, dx: u32, dy: u32| {
            (
                x as f32 + (p.x - self.min_x) as f32 * self.scale + dx as f32,
                y as f32 + (p.y - self.top) as f32 * self.scale + dy as f32,
            )
        };
        for dy in 0..self.weight {
            for dx in 0..self.weight {
                for pair in self.points.windows(2) {
                    if pair[1].pen {
                        draw_line_segment_mut(
                            img,
                            project(&pair[0], dx, dy),
                            project(&pair[1], dx, dy),
                            Luma([FOREGROUND]),
                        );
                    }
                }
            }
        }
    }
}

struct PlacedLine {
    text: String,
    x: u32,
    y: u32,
}

struct CaptionLayout {
    px: f32,
    lines: Vec<PlacedLine>,
}

/// Render a caption patch of at most `size` x `size` pixels.
///
/// The label line is centered horizontally with the description wrapped below
/// it, using the largest font size at which everything fits inside the inset.
/// When text metrics can't be computed the display text is drawn from a fixed
/// offset instead.
pub fn render_caption(
    label: &str,
    description: &str,
    size: u32,
    font: &CaptionFont,
) -> Result<Patch, CellError> {
    if size == 0 {
        return Err(CellError::Caption("zero sized caption patch".to_string()));
    }
    let mut patch = blank_patch(size, size);
    let text = display_text(label, description);
    if text.is_empty() {
        return Ok(patch);
    }

    match layout_caption(font, label, description, size) {
        Ok(layout) => {
            debug!(
                "Caption {:?}: {} lines at {} px",
                text,
                layout.lines.len(),
                layout.px
            );
            for line in layout.lines.iter() {
                font.draw(&mut patch, &line.text, line.x, line.y, layout.px);
            }
        }
        Err(err) => {
            debug!("{}, drawing caption at fixed offset", err);
            draw_fixed(font, &mut patch, &text);
        }
    }
    Ok(patch)
}

fn layout_caption(
    font: &CaptionFont,
    label: &str,
    description: &str,
    size: u32,
) -> Result<CaptionLayout, CellError> {
    let available = size.saturating_sub(2 * INSET).max(1);
    let max_px = (size / 4).max(MIN_FONT_PX);

    for px in (MIN_FONT_PX..=max_px).rev().step_by(FONT_STEP) {
        let px = px as f32;
        let lines = wrap_caption(font, label, description, px, available)?;
        let line_height = font.line_height(px);
        let count = lines.len() as u32;
        let height = count * line_height + count.saturating_sub(1) * LINE_SPACING;
        if height <= available && lines.iter().all(|(_, w)| *w <= available) {
            return Ok(place(lines, px, line_height, size));
        }
    }

    let px = MIN_FONT_PX as f32;
    let lines = wrap_caption(font, label, description, px, available)?;
    Ok(place(lines, px, font.line_height(px), size))
}

/// Word-wrap each caption line to `available` pixels, keeping measured widths.
fn wrap_caption(
    font: &CaptionFont,
    label: &str,
    description: &str,
    px: f32,
    available: u32,
) -> Result<Vec<(String, u32)>, CellError> {
    let mut wrapped = Vec::new();
    for line in caption_lines(label, description) {
        let mut current: Option<(String, u32)> = None;
        for word in line.split_whitespace() {
            let candidate = match &current {
                Some((text, _)) => format!("{} {}", text, word),
                None => word.to_string(),
            };
            let width = font.measure(&candidate, px)?;
            if width <= available || current.is_none() {
                current = Some((candidate, width));
            } else {
                wrapped.extend(current.take());
                let width = font.measure(word, px)?;
                current = Some((word.to_string(), width));
            }
        }
        wrapped.extend(current);
    }
    Ok(wrapped)
}

fn place(lines: Vec<(String, u32)>, px: f32, line_height: u32, size: u32) -> CaptionLayout {
    let mut y = INSET;
    let lines = lines
        .into_iter()
        .map(|(text, width)| {
            let x = (size.saturating_sub(width) / 2).max(INSET);
            let placed = PlacedLine { text, x, y };
            y += line_height + LINE_SPACING;
            placed
        })
        .collect();
    CaptionLayout { px, lines }
}

/// Draw the display text in fixed-width chunks from the top-left inset.
fn draw_fixed(font: &CaptionFont, patch: &mut Patch, text: &str) {
    let line_height = font.line_height(FIXED_FONT_PX) + LINE_SPACING;
    let chars: Vec<char> = text.chars().collect();
    for (i, chunk) in chars.chunks(FIXED_WRAP).enumerate() {
        let line: String = chunk.iter().collect();
        font.draw(patch, &line, INSET, INSET + i as u32 * line_height, FIXED_FONT_PX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{utils::mean_intensity, BACKGROUND};
    use std::path::PathBuf;

    fn system_font() -> Option<CaptionFont> {
        let path = PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
        CaptionFont::load(&path).ok()
    }

    fn inked_columns(patch: &Patch) -> Vec<u32> {
        (0..patch.width())
            .filter(|&x| (0..patch.height()).any(|y| patch.get_pixel(x, y).0[0] == FOREGROUND))
            .collect()
    }

    #[test]
    fn display_text_joins_label_and_description() {
        assert_eq!(display_text("A1", "Tomato"), "A1 Tomato");
        assert_eq!(display_text("A1", ""), "A1");
        assert_eq!(display_text("", ""), "");
    }

    #[test]
    fn empty_description_gives_single_line() {
        assert_eq!(caption_lines("A1", ""), vec!["A1".to_string()]);
        assert_eq!(
            caption_lines("A1", "Cherry tomato"),
            vec!["A1".to_string(), "Cherry tomato".to_string()]
        );
    }

    #[test]
    fn missing_font_falls_back_to_stroke() {
        assert!(!CaptionFont::resolve(None).is_scalable());
        let missing = PathBuf::from("/nonexistent/font.ttf");
        assert!(matches!(
            CaptionFont::load(&missing),
            Err(FontError::Unreadable { .. })
        ));
        assert!(!CaptionFont::resolve(Some(&missing)).is_scalable());
    }

    #[test]
    fn invalid_font_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(matches!(
            CaptionFont::load(&path),
            Err(FontError::Invalid(_))
        ));
    }

    #[test]
    fn stroke_caption_draws_ink_inside_inset() {
        let font = CaptionFont::Stroke;
        let patch = render_caption("B-12", "Sweet basil", 200, &font).unwrap();
        assert_eq!(patch.dimensions(), (200, 200));
        assert!(patch
            .pixels()
            .all(|p| p.0[0] == BACKGROUND || p.0[0] == FOREGROUND));
        let columns = inked_columns(&patch);
        assert!(!columns.is_empty());
        assert!(columns[0] >= INSET);
        assert!(mean_intensity(&patch) > 128.0);
    }

    #[test]
    fn label_line_is_centered() {
        let font = CaptionFont::Stroke;
        let patch = render_caption("HH", "", 300, &font).unwrap();
        let columns = inked_columns(&patch);
        let left = columns[0];
        let right = 300 - 1 - columns[columns.len() - 1];
        assert!((left as i64 - right as i64).abs() <= 4, "{} vs {}", left, right);
    }

    #[test]
    fn empty_caption_is_blank() {
        let patch = render_caption("", "", 64, &CaptionFont::Stroke).unwrap();
        assert!(patch.pixels().all(|p| p.0[0] == BACKGROUND));
    }

    #[test]
    fn zero_size_is_an_error() {
        assert!(matches!(
            render_caption("A", "", 0, &CaptionFont::Stroke),
            Err(CellError::Caption(_))
        ));
    }

    #[test]
    fn larger_patch_uses_larger_font() {
        let font = CaptionFont::Stroke;
        let small = layout_caption(&font, "A1", "Basil", 100).unwrap();
        let large = layout_caption(&font, "A1", "Basil", 400).unwrap();
        assert!(large.px > small.px);
    }

    #[test]
    fn long_description_wraps_within_patch() {
        let font = CaptionFont::Stroke;
        let description = "Solanum lycopersicum cherry variety grown in tray seven";
        let layout = layout_caption(&font, "T-7", description, 240).unwrap();
        assert!(layout.lines.len() > 2);
        assert_eq!(layout.lines[0].text, "T-7");
        for pair in layout.lines.windows(2) {
            assert!(pair[1].y > pair[0].y);
        }
    }

    #[test]
    fn unmeasurable_text_still_renders() {
        // no Hershey strokes for CJK, the fixed-offset path must not fail
        let font = CaptionFont::Stroke;
        assert!(font.measure("植物", 20.0).is_err());
        let patch = render_caption("植物", "A1", 120, &font).unwrap();
        assert_eq!(patch.dimensions(), (120, 120));

        // " A1" has strokes, drawn from the top-left inset rather than centered
        let columns = inked_columns(&patch);
        assert!(!columns.is_empty());
        assert!(columns[0] >= INSET && columns[0] <= INSET + 4, "{}", columns[0]);
        let rows: Vec<u32> = (0..patch.height())
            .filter(|&y| (0..patch.width()).any(|x| patch.get_pixel(x, y).0[0] == FOREGROUND))
            .collect();
        assert!(rows[0] >= INSET && rows[0] < INSET + FIXED_FONT_PX as u32);
    }

    #[test]
    fn scalable_font_caption() {
        let font = match system_font() {
            Some(font) => font,
            None => return,
        };
        assert!(font.is_scalable());
        let patch = render_caption("A1", "Tomato", 300, &font).unwrap();
        assert!(patch
            .pixels()
            .all(|p| p.0[0] == BACKGROUND || p.0[0] == FOREGROUND));
        assert!(inked_columns(&patch)[0] >= INSET);
    }
}
