#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::labels::label_for_class;
use crate::detect::result::{BoundingBox, Detection};

/// Tract-based object detection backend for ONNX models.
///
/// The model is expected to take one NCHW f32 input of shape
/// `[1, 3, height, width]` with values in [0, 1] and produce one output of
/// shape `[1, N, 6]` (or `[N, 6]`) whose rows are
/// `[x1, y1, x2, y2, score, class]` in model-input pixel coordinates.
/// Frames are resized to the model input size; boxes are scaled back to
/// frame coordinates.
pub struct TractBackend {
    model: TypedSimplePlan<TypedModel>,
    input_width: u32,
    input_height: u32,
}

impl TractBackend {
    pub const NAME: &'static str = "tract";

    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
        })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let frame = RgbImage::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| anyhow!("invalid frame buffer"))?;
        let resized = if (width, height) == (self.input_width, self.input_height) {
            frame
        } else {
            image::imageops::resize(
                &frame,
                self.input_width,
                self.input_height,
                FilterType::Triangle,
            )
        };

        let input_width = self.input_width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.input_height as usize, input_width),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32).0[channel] as f32 / 255.0,
        );
        Ok(input.into_tensor())
    }

    fn decode_output(
        &self,
        outputs: TVec<TValue>,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let flat: Vec<f32> = view.iter().copied().collect();
        if flat.len() % 6 != 0 {
            return Err(anyhow!(
                "model output length {} is not a multiple of 6",
                flat.len()
            ));
        }

        let scale_x = frame_width as f32 / self.input_width as f32;
        let scale_y = frame_height as f32 / self.input_height as f32;

        let mut detections = Vec::new();
        for row in flat.chunks_exact(6) {
            let (x1, y1, x2, y2, score, class) =
                (row[0], row[1], row[2], row[3], row[4], row[5]);
            if !score.is_finite() || score <= 0.0 {
                continue;
            }
            let bbox = BoundingBox::new(
                x1 * scale_x,
                y1 * scale_y,
                (x2 - x1) * scale_x,
                (y2 - y1) * scale_y,
            )
            .clamped_to(frame_width, frame_height);
            if !bbox.is_valid() {
                continue;
            }
            detections.push(Detection::new(
                label_for_class(class as usize),
                score.clamp(0.0, 1.0),
                bbox,
            ));
        }
        Ok(detections)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode_output(outputs, width, height)
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = vec![0u8; (self.input_width * self.input_height * 3) as usize];
        self.detect(&blank, self.input_width, self.input_height)?;
        Ok(())
    }
}
