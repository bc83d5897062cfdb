use crate::error::*;
use crate::layout::*;
use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use log::{error, info, warn};
use std::f32::consts::SQRT_2;
use std::io::Cursor;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Drawing surface the layout commands are executed against.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>);
    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, width: f32);
    fn fill_text(&mut self, line: &TextLine, color: Rgba<u8>);
    fn hatch(&mut self, rect: Rect, color: Rgba<u8>, spacing: f32, line_width: f32);
}

/// Runs the commands in order against `canvas`.
pub fn execute<C: Canvas + ?Sized>(commands: &[DrawCommand], canvas: &mut C) {
    for command in commands {
        match command {
            DrawCommand::BorderedRect {
                rect,
                fill,
                border,
                border_width,
            } => {
                canvas.fill_rect(*rect, *fill);
                canvas.stroke_rect(*rect, *border, *border_width);
            }
            DrawCommand::TextBlock { lines, color } => {
                for line in lines {
                    canvas.fill_text(line, *color);
                }
            }
            DrawCommand::Hatch {
                rect,
                color,
                spacing,
                line_width,
            } => canvas.hatch(*rect, *color, *spacing, *line_width),
        }
    }
}

// ----------------------------------------------------------------------------
// Fonts
// ----------------------------------------------------------------------------

/// DejaVu Sans, compiled in. Covers Vietnamese.
const BUNDLED_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");
const BUNDLED_FONT_NAME: &str = "DejaVu Sans (bundled)";

/// The compiled-in sans-serif font, last entry of every font stack.
pub fn bundled_font() -> Option<FontArc> {
    match FontArc::try_from_slice(BUNDLED_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            error!("Bundled font is not usable: {}", e);
            None
        }
    }
}

/// Pixel scale giving the font an em size of `size_px`, like a CSS font size.
pub fn em_scale(font: &FontArc, size_px: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.);
    let height = font.ascent_unscaled() - font.descent_unscaled();

    PxScale::from(size_px * height / units_per_em)
}

/// Measures text with a real font at a fixed scale.
pub struct FontMeasure<'a> {
    font: &'a FontArc,
    scale: PxScale,
}

impl<'a> FontMeasure<'a> {
    pub fn new(font: &'a FontArc, scale: PxScale) -> Self {
        FontMeasure { font, scale }
    }
}

impl<'a> TextMeasure for FontMeasure<'a> {
    fn width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.;
        let mut previous: Option<GlyphId> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                width += scaled.kern(previous, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }

        width
    }

    fn height(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = 0.;
        let mut bounds: Option<(f32, f32)> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            let glyph = id.with_scale_and_position(self.scale, point(caret, 0.));
            caret += scaled.h_advance(id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let px = outlined.px_bounds();
                bounds = Some(match bounds {
                    Some((top, bottom)) => (top.min(px.min.y), bottom.max(px.max.y)),
                    None => (px.min.y, px.max.y),
                });
            }
        }

        bounds.map(|(top, bottom)| bottom - top).unwrap_or(0.)
    }
}

/// Ordered font candidates, first one that loads wins. The bundled font is
/// tried after every candidate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontStack {
    candidates: Vec<(String, PathBuf)>,
}

impl FontStack {
    pub fn new(candidates: Vec<(String, PathBuf)>) -> Self {
        FontStack { candidates }
    }

    /// Explicit list of font files, tried in order.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        let candidates = paths
            .into_iter()
            .map(|path| {
                let family = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (family, path)
            })
            .collect();

        FontStack { candidates }
    }

    /// `TableFont`, then `Arial`, then a generic sans-serif.
    pub fn for_families(font_dir: &Path) -> Self {
        let mut candidates = Vec::new();

        for family in FONT_FAMILIES {
            let paths: Vec<PathBuf> = match family {
                "TableFont" => vec![
                    font_dir.join("TableFont.ttf"),
                    font_dir.join("TableFont.otf"),
                ],
                "Arial" => vec![
                    font_dir.join("Arial.ttf"),
                    PathBuf::from("/usr/share/fonts/truetype/msttcorefonts/Arial.ttf"),
                    PathBuf::from("/usr/share/fonts/TTF/arial.ttf"),
                    PathBuf::from("/Library/Fonts/Arial.ttf"),
                    PathBuf::from("C:\\Windows\\Fonts\\arial.ttf"),
                ],
                _ => vec![
                    PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
                    PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"),
                    PathBuf::from("/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
                ],
            };

            candidates.extend(paths.into_iter().map(|path| (family.to_string(), path)));
        }

        FontStack { candidates }
    }

    pub fn candidates(&self) -> &[(String, PathBuf)] {
        &self.candidates
    }

    pub fn resolve(&self) -> Option<FontArc> {
        for (family, path) in &self.candidates {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(_) => continue,
            };

            match FontArc::try_from_vec(bytes) {
                Ok(font) => {
                    info!("Using font {} from {}", family, path.display());
                    return Some(font);
                }
                Err(e) => warn!("Font file {} is not usable: {}", path.display(), e),
            }
        }

        let font = bundled_font();
        match &font {
            Some(_) => info!("Using font {}", BUNDLED_FONT_NAME),
            None => warn!("No font could be loaded, text will not be drawn!"),
        }
        font
    }
}

// ----------------------------------------------------------------------------
// Raster backend
// ----------------------------------------------------------------------------

/// Pixel range covered by `start..start + len`, clamped to `0..limit`.
fn pixel_span(start: f32, len: f32, limit: u32) -> Range<u32> {
    let clamp = |v: f32| v.round().max(0.).min(limit as f32) as u32;
    let lo = clamp(start);
    let hi = clamp(start + len);

    lo..hi.max(lo)
}

/// RGBA image sized to the background it starts from.
pub struct RasterCanvas<'a> {
    image: RgbaImage,
    font: Option<&'a FontArc>,
    scale: PxScale,
}

impl<'a> RasterCanvas<'a> {
    pub fn new(background: RgbaImage, font: Option<&'a FontArc>) -> Self {
        let scale = match font {
            Some(font) => em_scale(font, FONT_SIZE_PX),
            None => PxScale::from(FONT_SIZE_PX),
        };

        RasterCanvas {
            image: background,
            font,
            scale,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn encode_png(&self) -> TkbResult<Vec<u8>> {
        let mut bytes: Vec<u8> = Vec::new();

        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| TkbError::Encode(e.to_string()))?;

        Ok(bytes)
    }

    fn spans(&self, rect: Rect) -> (Range<u32>, Range<u32>) {
        let rect = rect.normalized();
        (
            pixel_span(rect.x, rect.width, self.image.width()),
            pixel_span(rect.y, rect.height, self.image.height()),
        )
    }
}

impl<'a> Canvas for RasterCanvas<'a> {
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let (xs, ys) = self.spans(rect);

        for y in ys {
            for x in xs.clone() {
                self.image.get_pixel_mut(x, y).blend(&color);
            }
        }
    }

    /// Border centered on the rectangle edge, half inside and half outside.
    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, width: f32) {
        let rect = rect.normalized();
        let half = width / 2.;

        let outer = Rect {
            x: rect.x - half,
            y: rect.y - half,
            width: rect.width + width,
            height: rect.height + width,
        };
        let inner = Rect {
            x: rect.x + half,
            y: rect.y + half,
            width: (rect.width - width).max(0.),
            height: (rect.height - width).max(0.),
        };

        let (xs, ys) = self.spans(outer);
        let (inner_xs, inner_ys) = self.spans(inner);

        for y in ys {
            for x in xs.clone() {
                if inner_xs.contains(&x) && inner_ys.contains(&y) {
                    continue;
                }
                self.image.get_pixel_mut(x, y).blend(&color);
            }
        }
    }

    fn fill_text(&mut self, line: &TextLine, color: Rgba<u8>) {
        let font = match self.font {
            Some(font) => font,
            None => return,
        };

        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        if !line.x.is_finite() || !line.y.is_finite() {
            return;
        }
        if line.x >= w || line.y >= h || line.x < -w || line.y < -h {
            return;
        }

        draw_text_mut(
            &mut self.image,
            color,
            line.x.round() as i32,
            line.y.round() as i32,
            self.scale,
            font,
            &line.text,
        );
    }

    /// Stripes run from top-left to bottom-right, starting one rectangle
    /// height left of the rectangle and repeating every `spacing` pixels.
    /// Only pixels inside the rectangle are touched.
    fn hatch(&mut self, rect: Rect, color: Rgba<u8>, spacing: f32, line_width: f32) {
        let rect = rect.normalized();
        if rect.width <= 0. || rect.height <= 0. || spacing <= 0. {
            return;
        }

        // Horizontal offset from a stripe that is still within half a line width
        let reach = line_width / 2. * SQRT_2;
        let (xs, ys) = self.spans(rect);

        for y in ys {
            for x in xs.clone() {
                let offset = (x as f32 + 0.5 - rect.x) - (y as f32 + 0.5 - rect.y);
                let nearest = ((offset + rect.height) / spacing).round();

                let on_stripe = [nearest - 1., nearest, nearest + 1.].iter().any(|k| {
                    let stripe = -rect.height + k * spacing;
                    *k >= 0. && stripe < rect.width && (offset - stripe).abs() <= reach
                });

                if on_stripe {
                    self.image.get_pixel_mut(x, y).blend(&color);
                }
            }
        }
    }
}
