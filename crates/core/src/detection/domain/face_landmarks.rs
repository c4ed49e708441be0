//! 68-point facial landmarks (iBUG 300-W layout).
//!
//! Index ranges: jaw 0-16, brows 17-26, nose 27-35, left eye 36-41,
//! right eye 42-47, mouth 48-67.

use crate::shared::geometry::BoundingBox;

pub const NUM_LANDMARKS: usize = 68;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<(f64, f64)>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, String> {
        if points.len() != NUM_LANDMARKS {
            return Err(format!(
                "expected {NUM_LANDMARKS} landmarks, got {}",
                points.len()
            ));
        }
        Ok(Self { points })
    }

    /// Maps `[x0, y0, x1, y1, ...]` values relative to a face crop
    /// (0.0 = crop origin, 1.0 = crop extent) into frame coordinates.
    pub fn from_relative(values: &[f32], crop: &BoundingBox) -> Result<Self, String> {
        if values.len() != NUM_LANDMARKS * 2 {
            return Err(format!(
                "expected {} landmark values, got {}",
                NUM_LANDMARKS * 2,
                values.len()
            ));
        }
        let points = values
            .chunks_exact(2)
            .map(|p| {
                (
                    crop.x + p[0] as f64 * crop.width,
                    crop.y + p[1] as f64 * crop.height,
                )
            })
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self {
            points: self.points.iter().map(|(x, y)| (x * sx, y * sy)).collect(),
        }
    }
}
