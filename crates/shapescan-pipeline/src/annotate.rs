//! Draw detected outlines and their labels onto a copy of the input.
//!
//! Rendering goes through `tiny-skia`, which works on premultiplied
//! RGBA. The input is premultiplied into a [`Pixmap`], outlines are
//! stroked anti-aliased as closed paths, label glyph cells are filled
//! as solid rectangles, and the result is converted back to straight
//! RGBA.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::glyphs::{self, ADVANCE, GLYPH_HEIGHT};
use crate::types::{Detection, PipelineError, invalid};

/// Colors and sizes used when drawing the annotated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateStyle {
    /// RGB color of the outline stroke.
    pub outline_color: [u8; 3],
    /// Outline stroke width in pixels.
    pub stroke_width: f32,
    /// RGB color of the label text.
    pub label_color: [u8; 3],
    /// Pixels per font unit of the label glyphs.
    pub label_scale: u32,
    /// Distance in pixels from the label baseline up to the anchor.
    pub label_offset: u32,
}

impl AnnotateStyle {
    /// Cyan.
    pub const DEFAULT_OUTLINE_COLOR: [u8; 3] = [0, 255, 255];
    /// Default outline width.
    pub const DEFAULT_STROKE_WIDTH: f32 = 3.0;
    /// Magenta.
    pub const DEFAULT_LABEL_COLOR: [u8; 3] = [255, 0, 255];
    /// Default glyph scale (a 10x14 pixel cell).
    pub const DEFAULT_LABEL_SCALE: u32 = 2;
    /// Default baseline offset above the anchor.
    pub const DEFAULT_LABEL_OFFSET: u32 = 8;
    /// Largest accepted glyph scale.
    pub const MAX_LABEL_SCALE: u32 = 16;

    /// Check sizes for values the renderer cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when the stroke width is
    /// not a positive finite number or the label scale is out of range.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.stroke_width.is_finite() && self.stroke_width > 0.0) {
            return Err(invalid(format!(
                "stroke_width must be positive and finite, got {}",
                self.stroke_width
            )));
        }
        if !(1..=Self::MAX_LABEL_SCALE).contains(&self.label_scale) {
            return Err(invalid(format!(
                "label_scale must be in 1..={}, got {}",
                Self::MAX_LABEL_SCALE,
                self.label_scale
            )));
        }
        Ok(())
    }
}

impl Default for AnnotateStyle {
    fn default() -> Self {
        Self {
            outline_color: Self::DEFAULT_OUTLINE_COLOR,
            stroke_width: Self::DEFAULT_STROKE_WIDTH,
            label_color: Self::DEFAULT_LABEL_COLOR,
            label_scale: Self::DEFAULT_LABEL_SCALE,
            label_offset: Self::DEFAULT_LABEL_OFFSET,
        }
    }
}

/// Render outlines and labels for `detections` onto a copy of `image`.
///
/// Outlines are drawn first, then labels, so text is never covered by a
/// neighbouring outline. Labels are clamped to stay inside the image.
#[must_use = "returns the annotated copy; the input is not modified"]
pub fn annotate(image: &RgbaImage, detections: &[Detection], style: &AnnotateStyle) -> RgbaImage {
    let (width, height) = image.dimensions();
    let Some(mut pixmap) = IntSize::from_wh(width, height)
        .and_then(|size| Pixmap::from_vec(premultiply(image), size))
    else {
        return image.clone();
    };

    let stroke = Stroke {
        width: style.stroke_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let mut outline = Paint::default();
    let [r, g, b] = style.outline_color;
    outline.set_color_rgba8(r, g, b, 255);
    outline.anti_alias = true;

    for detection in detections {
        if let Some(path) = closed_path(detection) {
            pixmap.stroke_path(&path, &outline, &stroke, Transform::identity(), None);
        }
    }

    let mut text = Paint::default();
    let [r, g, b] = style.label_color;
    text.set_color_rgba8(r, g, b, 255);
    text.anti_alias = false;

    for detection in detections {
        draw_label(&mut pixmap, detection, style, &text);
    }

    unpremultiply(&pixmap, width, height)
}

/// Closed `tiny-skia` path through every boundary point.
#[allow(clippy::cast_possible_truncation)]
fn closed_path(detection: &Detection) -> Option<tiny_skia::Path> {
    let points = detection.boundary.points();
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}

/// Top-left pixel of a label of `text_width` x `text_height` pixels.
///
/// The baseline sits `offset` pixels above the anchor; the box is then
/// shifted as needed to lie inside a `width` x `height` image.
#[allow(clippy::cast_possible_truncation)]
fn label_origin(
    anchor: (f64, f64),
    text_width: u32,
    text_height: u32,
    offset: u32,
    (width, height): (u32, u32),
) -> (i64, i64) {
    let max_x = i64::from(width.saturating_sub(text_width));
    let max_y = i64::from(height.saturating_sub(text_height));
    let x = (anchor.0.round() as i64).clamp(0, max_x);
    let baseline = anchor.1.round() as i64 - i64::from(offset);
    let y = (baseline - i64::from(text_height)).clamp(0, max_y);
    (x, y)
}

#[allow(clippy::cast_precision_loss)]
fn draw_label(pixmap: &mut Pixmap, detection: &Detection, style: &AnnotateStyle, paint: &Paint) {
    let label = detection.record.label.as_str();
    let scale = style.label_scale;
    let anchor = detection.record.anchor;
    let (x0, y0) = label_origin(
        (anchor.x, anchor.y),
        glyphs::text_width(label).saturating_mul(scale),
        GLYPH_HEIGHT.saturating_mul(scale),
        style.label_offset,
        (pixmap.width(), pixmap.height()),
    );

    let cell = scale as f32;
    let scale = i64::from(scale);
    for (i, c) in (0_i64..).zip(label.chars()) {
        let gx = x0 + i * i64::from(ADVANCE) * scale;
        for (col, row) in glyphs::lit_cells(c) {
            let px = gx + i64::from(col) * scale;
            let py = y0 + i64::from(row) * scale;
            if let Some(rect) = Rect::from_xywh(px as f32, py as f32, cell, cell) {
                pixmap.fill_rect(rect, paint, Transform::identity(), None);
            }
        }
    }
}

/// Straight RGBA bytes to premultiplied RGBA bytes.
#[allow(clippy::cast_possible_truncation)]
fn premultiply(image: &RgbaImage) -> Vec<u8> {
    let mut data = Vec::with_capacity(image.as_raw().len());
    for Rgba([r, g, b, a]) in image.pixels().copied() {
        let mul = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
        data.extend_from_slice(&[mul(r), mul(g), mul(b), a]);
    }
    data
}

/// Convert the pixmap (premultiplied RGBA) to an `RgbaImage` (straight RGBA).
#[allow(clippy::cast_possible_truncation)]
fn unpremultiply(pixmap: &Pixmap, width: u32, height: u32) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(width, height);
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            let un = |c: u8| (u16::from(c) * 255 / u16::from(a)).min(255) as u8;
            *pixel = Rgba([un(data[off]), un(data[off + 1]), un(data[off + 2]), a]);
        }
    }
    img
}
