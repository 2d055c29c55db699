use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};

const CELL: u32 = 16;
const BRIGHT_LUMA: f32 = 200.0;
/// Components covering at least this fraction of the frame are "large".
const LARGE_AREA_FRACTION: f32 = 0.15;

/// Built-in brightness-region detector.
///
/// Splits the frame into 16x16 cells, marks cells whose mean luma exceeds a
/// fixed threshold, and merges connected bright cells into labeled boxes.
/// It exists so default builds can run the full pipeline against the
/// synthetic camera without an ONNX model.
#[derive(Default)]
pub struct LumaBackend;

impl LumaBackend {
    pub const NAME: &'static str = "luma";

    pub fn new() -> Self {
        Self
    }
}

impl DetectorBackend for LumaBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        if width < CELL || height < CELL {
            return Ok(Vec::new());
        }

        let cols = width / CELL;
        let rows = height / CELL;
        let luma = cell_luma(pixels, width, cols, rows);

        let frame_area = (width * height) as f32;
        let mut detections = Vec::new();
        for component in bright_components(&luma, cols, rows) {
            let bbox = component.bbox();
            let label = if bbox.w * bbox.h >= frame_area * LARGE_AREA_FRACTION {
                "large object"
            } else {
                "small object"
            };
            detections.push(Detection::new(label, component.confidence(), bbox));
        }
        Ok(detections)
    }
}

/// Mean luma (BT.601) per cell, row-major `rows x cols`.
fn cell_luma(pixels: &[u8], width: u32, cols: u32, rows: u32) -> Vec<f32> {
    let mut luma = vec![0.0f32; (cols * rows) as usize];
    for row in 0..rows {
        for col in 0..cols {
            let mut sum = 0.0f32;
            for dy in 0..CELL {
                let y = row * CELL + dy;
                for dx in 0..CELL {
                    let x = col * CELL + dx;
                    let idx = ((y * width + x) * 3) as usize;
                    let (r, g, b) = (pixels[idx], pixels[idx + 1], pixels[idx + 2]);
                    sum += 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
                }
            }
            luma[(row * cols + col) as usize] = sum / (CELL * CELL) as f32;
        }
    }
    luma
}

struct Component {
    min_col: u32,
    min_row: u32,
    max_col: u32,
    max_row: u32,
    peak_luma: f32,
}

impl Component {
    fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            (self.min_col * CELL) as f32,
            (self.min_row * CELL) as f32,
            ((self.max_col - self.min_col + 1) * CELL) as f32,
            ((self.max_row - self.min_row + 1) * CELL) as f32,
        )
    }

    fn confidence(&self) -> f32 {
        ((self.peak_luma - BRIGHT_LUMA) / (255.0 - BRIGHT_LUMA)).clamp(0.0, 1.0) * 0.5 + 0.5
    }
}

/// 4-connected components over the bright-cell mask.
fn bright_components(luma: &[f32], cols: u32, rows: u32) -> Vec<Component> {
    let mut visited = vec![false; luma.len()];
    let mut components = Vec::new();

    for start in 0..luma.len() {
        if visited[start] || luma[start] < BRIGHT_LUMA {
            continue;
        }
        let mut component = Component {
            min_col: cols,
            min_row: rows,
            max_col: 0,
            max_row: 0,
            peak_luma: 0.0,
        };
        let mut queue = vec![start];
        visited[start] = true;
        while let Some(idx) = queue.pop() {
            let col = idx as u32 % cols;
            let row = idx as u32 / cols;
            component.min_col = component.min_col.min(col);
            component.min_row = component.min_row.min(row);
            component.max_col = component.max_col.max(col);
            component.max_row = component.max_row.max(row);
            component.peak_luma = component.peak_luma.max(luma[idx]);

            let mut push = |col: u32, row: u32| {
                let next = (row * cols + col) as usize;
                if !visited[next] && luma[next] >= BRIGHT_LUMA {
                    visited[next] = true;
                    queue.push(next);
                }
            };
            if col > 0 {
                push(col - 1, row);
            }
            if col + 1 < cols {
                push(col + 1, row);
            }
            if row > 0 {
                push(col, row - 1);
            }
            if row + 1 < rows {
                push(col, row + 1);
            }
        }
        components.push(component);
    }
    components
}
