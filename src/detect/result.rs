/// Axis-aligned bounding box in pixel coordinates of the source frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_valid(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Clamp the box to frame bounds. Boxes fully outside collapse to zero size.
    pub fn clamped_to(&self, width: u32, height: u32) -> Self {
        let max_x = width as f32;
        let max_y = height as f32;
        let x = self.x.clamp(0.0, max_x);
        let y = self.y.clamp(0.0, max_y);
        let w = (self.x + self.w).clamp(0.0, max_x) - x;
        let h = (self.y + self.h).clamp(0.0, max_y) - y;
        Self { x, y, w, h }
    }
}

/// One labeled, scored, localized object found in a frame or image.
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    /// Score in [0, 1].
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// Deduplicated labels at or above `threshold`, in first-occurrence order.
///
/// Both the renderer's status line and the speech notifier use this rule, so
/// it lives here rather than in either consumer.
pub fn labels_above(detections: &[Detection], threshold: f32) -> Vec<&str> {
    let mut labels: Vec<&str> = Vec::new();
    for det in detections {
        if det.confidence < threshold {
            continue;
        }
        if !labels.iter().any(|known| *known == det.label) {
            labels.push(&det.label);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn labels_are_deduplicated_in_first_occurrence_order() {
        let detections = vec![det("cat", 0.9), det("cat", 0.5), det("dog", 0.7)];
        assert_eq!(labels_above(&detections, 0.6), vec!["cat", "dog"]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let detections = vec![det("cat", 0.6)];
        assert_eq!(labels_above(&detections, 0.6), vec!["cat"]);
        assert_eq!(labels_above(&detections, 0.61), Vec::<&str>::new());
    }

    #[test]
    fn clamp_keeps_boxes_inside_the_frame() {
        let clamped = BoundingBox::new(-10.0, 5.0, 30.0, 100.0).clamped_to(64, 48);
        assert_eq!(clamped.x, 0.0);
        assert_eq!(clamped.y, 5.0);
        assert_eq!(clamped.w, 20.0);
        assert_eq!(clamped.h, 43.0);
    }
}
