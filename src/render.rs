//! Annotated-frame renderer.
//!
//! Draws the source frame as background, outlines every detection at or
//! above the draw threshold, and writes a `"{label} {pct}%"` caption above
//! each box (or just inside the top edge when the box touches it). Also
//! produces the user-visible status line summarizing the deduplicated label
//! set.
//!
//! Label captions need a font. The renderer works without one (boxes and
//! status only); binaries load a TTF/OTF from the configured path.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::detect::{labels_above, Detection};
use crate::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LABEL_SCALE: f32 = 16.0;

/// Output of one render pass.
pub struct RenderOutput {
    /// Frame with boxes and captions drawn on it.
    pub image: RgbImage,
    /// User-visible status line.
    pub status: String,
    /// Number of boxes drawn.
    pub drawn: usize,
}

pub struct Renderer {
    color: Rgb<u8>,
    font: Option<FontArc>,
    scale: PxScale,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            color: BOX_COLOR,
            font: None,
            scale: PxScale::from(LABEL_SCALE),
        }
    }

    /// Load a TTF/OTF font for label captions.
    pub fn with_font_path<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|_| anyhow!("invalid font file {}", path.display()))?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw `frame` plus every detection with `confidence >= threshold`.
    pub fn render(&self, frame: &Frame, detections: &[Detection], threshold: f32) -> RenderOutput {
        let mut image = frame.to_image();
        let mut drawn = 0usize;

        for det in detections {
            if det.confidence < threshold {
                continue;
            }
            let bbox = det.bbox.clamped_to(frame.width(), frame.height());
            if !bbox.is_valid() {
                continue;
            }
            let (x, y) = (bbox.x.round() as i32, bbox.y.round() as i32);
            let (w, h) = (bbox.w.round().max(1.0) as u32, bbox.h.round().max(1.0) as u32);

            // Two nested rectangles give a 2px outline.
            draw_hollow_rect_mut(&mut image, Rect::at(x, y).of_size(w, h), self.color);
            if w > 2 && h > 2 {
                draw_hollow_rect_mut(
                    &mut image,
                    Rect::at(x + 1, y + 1).of_size(w - 2, h - 2),
                    self.color,
                );
            }

            if let Some(font) = &self.font {
                let caption = format!("{} {:.1}%", det.label, det.confidence * 100.0);
                let (_, text_h) = text_size(self.scale, font, &caption);
                // Above the box, unless that would leave the surface.
                let caption_y = if y > text_h as i32 + 2 {
                    y - text_h as i32 - 2
                } else {
                    2
                };
                draw_text_mut(&mut image, self.color, x, caption_y, self.scale, font, &caption);
            }
            drawn += 1;
        }

        let labels = labels_above(detections, threshold);
        let status = if labels.is_empty() {
            "No objects detected.".to_string()
        } else {
            format!("Objects detected: {}", labels.join(", "))
        };

        RenderOutput {
            image,
            status,
            drawn,
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn dark_frame(width: u32, height: u32) -> Frame {
        Frame::from_rgb8(vec![0u8; (width * height * 3) as usize], width, height).unwrap()
    }

    #[test]
    fn draws_only_detections_above_threshold() {
        let frame = dark_frame(64, 64);
        let detections = vec![
            Detection::new("cat", 0.9, BoundingBox::new(8.0, 8.0, 16.0, 16.0)),
            Detection::new("dog", 0.3, BoundingBox::new(40.0, 40.0, 16.0, 16.0)),
        ];
        let out = Renderer::new().render(&frame, &detections, 0.6);

        assert_eq!(out.drawn, 1);
        assert_eq!(out.status, "Objects detected: cat");
        // Box outline lands on the background.
        assert_eq!(out.image.get_pixel(8, 8).0, [0, 255, 0]);
        // The below-threshold box is not drawn.
        assert_eq!(out.image.get_pixel(40, 40).0, [0, 0, 0]);
    }

    #[test]
    fn empty_set_reports_nothing_detected() {
        let frame = dark_frame(32, 32);
        let out = Renderer::new().render(&frame, &[], 0.6);
        assert_eq!(out.drawn, 0);
        assert_eq!(out.status, "No objects detected.");
    }

    #[test]
    fn invalid_boxes_are_skipped() {
        let frame = dark_frame(32, 32);
        let detections = vec![Detection::new(
            "ghost",
            0.9,
            BoundingBox::new(100.0, 100.0, 10.0, 10.0),
        )];
        let out = Renderer::new().render(&frame, &detections, 0.6);
        assert_eq!(out.drawn, 0);
        // Status still reflects the detection set, not the drawable subset.
        assert_eq!(out.status, "Objects detected: ghost");
    }
}
