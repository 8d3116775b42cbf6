//! Draws the caption over a generated image.
//!
//! The caption sits in the bottom-right corner, padded from both edges by
//! the font size. It is drawn as a translucent black outline with a
//! translucent white fill on top, so it reads on any background.

use ab_glyph::{Font, FontArc, InvalidFont, PxScale, ScaleFont, point};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::constants::{
    CAPTION_FILL, CAPTION_FONT_BYTES, CAPTION_FONT_SCALE, CAPTION_MAX_FONT_SIZE,
    CAPTION_MIN_FONT_SIZE, CAPTION_PREFIX, CAPTION_STROKE, CAPTION_STROKE_WIDTH,
};

/// Caption font size for an image `width` pixels wide.
pub fn caption_font_size(width: u32) -> f32 {
    (width as f32 * CAPTION_FONT_SCALE).clamp(CAPTION_MIN_FONT_SIZE, CAPTION_MAX_FONT_SIZE)
}

/// The caption drawn for a submission.
pub fn caption_for(submission: &str) -> String {
    format!("{CAPTION_PREFIX}{submission}")
}

/// Anti-aliased coverage of a line of text, 0.0 (empty) to 1.0 (solid),
/// covering a window of the surface whose top-left corner is `(left, top)`.
#[derive(Debug, Clone)]
struct CoverageMask {
    left: i64,
    top: i64,
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl CoverageMask {
    fn new(left: i64, top: i64, width: usize, height: usize) -> Self {
        Self {
            left,
            top,
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    fn get(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.data[y as usize * self.width + x as usize]
    }

    /// Adds coverage at surface coordinates, ignoring anything outside the window.
    fn add(&mut self, x: i64, y: i64, coverage: f32) {
        let (mx, my) = (x - self.left, y - self.top);
        if mx < 0 || my < 0 || mx >= self.width as i64 || my >= self.height as i64 {
            return;
        }
        let idx = my as usize * self.width + mx as usize;
        self.data[idx] = (self.data[idx] + coverage).min(1.0);
    }

    /// Grows the mask outward by `radius`, the way a centred stroke extends past an outline.
    fn dilate(&self, radius: f32) -> Self {
        let reach = radius.ceil() as i64;
        let radius_sq = radius * radius;
        let mut out = Self::new(self.left, self.top, self.width, self.height);
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                let mut best = 0.0f32;
                for dy in -reach..=reach {
                    for dx in -reach..=reach {
                        if (dx * dx + dy * dy) as f32 > radius_sq {
                            continue;
                        }
                        best = best.max(self.get(x + dx, y + dy));
                    }
                }
                out.data[y as usize * self.width + x as usize] = best;
            }
        }
        out
    }
}

/// Source-over blend of `color` onto `pixel` with the given coverage.
fn blend(pixel: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let alpha = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let inv = 1.0 - alpha;
    for channel in 0..3 {
        let value = color[channel] as f32 * alpha + pixel[channel] as f32 * inv;
        pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    let dst_alpha = pixel[3] as f32 / 255.0;
    pixel[3] = ((alpha + dst_alpha * inv) * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Overlays captions using a single loaded font.
#[derive(Clone, Debug)]
pub struct Compositor {
    font: FontArc,
}

impl Compositor {
    /// A compositor using the bundled caption font.
    pub fn bundled() -> Result<Self, InvalidFont> {
        FontArc::try_from_slice(CAPTION_FONT_BYTES).map(|font| Self { font })
    }

    /// Horizontal advance of `text` at `font_size`, in pixels.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(font_size));
        let mut caret = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, glyph_id);
            }
            caret += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        caret
    }

    /// Coverage of `caption` placed bottom-right on a `width` x `height`
    /// surface, or `None` when none of it can land on the surface.
    ///
    /// The window spans only the visible columns plus the stroke margin, so
    /// its size is bounded by the surface, not by the caption length.
    fn caption_mask(&self, caption: &str, width: u32, height: u32) -> Option<CoverageMask> {
        let font_size = caption_font_size(width);
        let scale = PxScale::from(font_size);
        let scaled = self.font.as_scaled(scale);
        let padding = font_size;
        let margin = (CAPTION_STROKE_WIDTH / 2.0).ceil() as i64;

        let text_width = self.text_width(caption, font_size);
        let text_x = width as f32 - text_width - padding;
        let baseline_y = height as f32 - padding;

        let left = (text_x.floor() as i64 - margin).max(-margin);
        let right = ((text_x + text_width).ceil() as i64 + margin).min(width as i64 + margin);
        let top = ((baseline_y - scaled.ascent()).floor() as i64 - margin).max(-margin);
        let bottom = ((baseline_y - scaled.descent()).ceil() as i64 + margin)
            .min(height as i64 + margin);
        if right <= left || bottom <= top {
            return None;
        }

        let mut mask = CoverageMask::new(
            left,
            top,
            (right - left) as usize,
            (bottom - top) as usize,
        );
        let mut caret = text_x;
        let mut previous = None;
        for ch in caption.chars() {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, glyph_id);
            }
            let advance = scaled.h_advance(glyph_id);
            // glyphs ending left of the window are never outlined
            if caret + advance + font_size >= left as f32 {
                let glyph = glyph_id.with_scale_and_position(scale, point(caret, baseline_y));
                if let Some(outlined) = self.font.outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    outlined.draw(|px, py, coverage| {
                        mask.add(
                            px as i64 + bounds.min.x as i64,
                            py as i64 + bounds.min.y as i64,
                            coverage,
                        );
                    });
                }
            }
            caret += advance;
            previous = Some(glyph_id);
        }

        Some(mask)
    }

    /// Returns a new surface the size of `bitmap`, with `bitmap` at the origin
    /// and `caption` in the bottom-right corner.
    pub fn composite(&self, bitmap: &DynamicImage, caption: &str) -> RgbaImage {
        let mut surface = bitmap.to_rgba8();
        if caption.is_empty() {
            return surface;
        }

        let (width, height) = surface.dimensions();
        let Some(fill) = self.caption_mask(caption, width, height) else {
            return surface;
        };
        let stroke = fill.dilate(CAPTION_STROKE_WIDTH / 2.0);

        for (mask, color) in [(&stroke, CAPTION_STROKE), (&fill, CAPTION_FILL)] {
            for my in 0..mask.height {
                let y = mask.top + my as i64;
                if y < 0 || y >= height as i64 {
                    continue;
                }
                for mx in 0..mask.width {
                    let x = mask.left + mx as i64;
                    if x < 0 || x >= width as i64 {
                        continue;
                    }
                    let coverage = mask.data[my * mask.width + mx];
                    if coverage > 0.0 {
                        blend(surface.get_pixel_mut(x as u32, y as u32), color, coverage);
                    }
                }
            }
        }

        surface
    }
}
