/// Axis-aligned face box in pixel coordinates of some reference image.
///
/// Coordinates are floating point so that rescaling between model input,
/// frame and display sizes does not accumulate rounding error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from `[x1, y1, x2, y2]` corners. Inverted corners yield
    /// a zero-sized box rather than a negative one.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0.0),
            height: (y2 - y1).max(0.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Multiplies every coordinate by the given per-axis factors.
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    /// Intersects the box with `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x1 = self.x.clamp(0.0, width as f64);
        let y1 = self.y.clamp(0.0, height as f64);
        let x2 = self.right().clamp(0.0, width as f64);
        let y2 = self.bottom().clamp(0.0, height as f64);
        Self::from_corners(x1, y1, x2, y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_iou_identical() {
        let a = BoundingBox::new(10.0, 10.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50*100 = 5000, union 15000
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(50.0, 0.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[rstest]
    #[case::disjoint(BoundingBox::new(100.0, 100.0, 50.0, 50.0))]
    #[case::touching(BoundingBox::new(50.0, 0.0, 50.0, 50.0))]
    fn test_iou_zero(#[case] other: BoundingBox) {
        let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&other), 0.0);
    }

    #[test]
    fn test_from_corners_inverted_is_empty() {
        let b = BoundingBox::from_corners(10.0, 10.0, 5.0, 20.0);
        assert!(b.is_empty());
        assert_relative_eq!(b.height, 10.0);
    }

    #[test]
    fn test_scale_per_axis() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0).scale(2.0, 0.5);
        assert_eq!(b, BoundingBox::new(20.0, 10.0, 60.0, 20.0));
    }

    #[test]
    fn test_clamp_to_frame() {
        let b = BoundingBox::new(-10.0, 90.0, 50.0, 50.0).clamp_to(100, 100);
        assert_eq!(b, BoundingBox::new(0.0, 90.0, 40.0, 10.0));
    }
}
