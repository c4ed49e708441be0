//! Display-space description of the detection overlay, and burning it into still images.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::detection::domain::face_analysis::{resize_results, FaceAnalysis};
use crate::shared::geometry::BoundingBox;

/// Default box colour (opaque blue).
pub const BOX_COLOR: [u8; 3] = [0, 0, 255];
pub const BOX_LINE_WIDTH: u32 = 2;
pub const LANDMARK_COLOR: [u8; 3] = [0, 255, 0];
const LANDMARK_RADIUS: i32 = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayItem {
    pub bbox: BoundingBox,
    pub label: String,
    pub landmarks: Vec<(f64, f64)>,
}

/// Everything drawn on the overlay surface for one set of results.
///
/// A scene fully replaces the previous one; nothing accumulates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayScene {
    pub size: (u32, u32),
    pub items: Vec<OverlayItem>,
}

impl OverlayScene {
    /// Builds a scene in display coordinates from results computed on a
    /// `frame_size` frame.
    pub fn from_results(
        results: &[FaceAnalysis],
        frame_size: (u32, u32),
        display_size: (u32, u32),
    ) -> Self {
        let items = resize_results(results, frame_size, display_size)
            .into_iter()
            .map(|face| OverlayItem {
                bbox: face.detection.bbox,
                label: face.label(),
                landmarks: face.landmarks.points().to_vec(),
            })
            .collect();
        Self {
            size: display_size,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Burns the landmark dots and box outlines of `scene` into `image`.
///
/// The scene must be expressed in the image's own coordinates. Boxes are
/// drawn last so they stay visible where a landmark touches the outline.
pub fn draw_scene(image: &mut RgbImage, scene: &OverlayScene) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    for item in &scene.items {
        for &(x, y) in &item.landmarks {
            let center = (clamp_to_pixel(x, width), clamp_to_pixel(y, height));
            draw_filled_circle_mut(image, center, LANDMARK_RADIUS, Rgb(LANDMARK_COLOR));
        }
    }

    for item in &scene.items {
        let bbox = item.bbox.clamp_to(width, height);
        if bbox.is_empty() {
            continue;
        }
        for inset in 0..BOX_LINE_WIDTH {
            if let Some(rect) = inset_rect(&bbox, inset) {
                draw_hollow_rect_mut(image, rect, Rgb(BOX_COLOR));
            }
        }
    }
}

/// `bbox` shrunk by `inset` pixels on every side, or `None` once nothing
/// is left of it.
fn inset_rect(bbox: &BoundingBox, inset: u32) -> Option<Rect> {
    let inset = i64::from(inset);
    let width = bbox.width.round() as i64 - 2 * inset;
    let height = bbox.height.round() as i64 - 2 * inset;
    if width <= 0 || height <= 0 {
        return None;
    }
    let x = bbox.x.round() as i64 + inset;
    let y = bbox.y.round() as i64 + inset;
    Some(Rect::at(x as i32, y as i32).of_size(width as u32, height as u32))
}

#[inline]
fn clamp_to_pixel(value: f64, extent: u32) -> i32 {
    value.clamp(0.0, f64::from(extent - 1)).round() as i32
}
