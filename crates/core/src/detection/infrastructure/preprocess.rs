//! Frame → NCHW tensor conversion shared by the ONNX stages.

use ndarray::Array4;

use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Pixel value mapping applied while sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Normalization {
    /// `p / 255` → [0, 1]
    UnitRange,
    /// `(p - 127) / 128` → roughly [-1, 1]
    Centered,
}

impl Normalization {
    fn apply(self, value: f32) -> f32 {
        match self {
            Normalization::UnitRange => value / 255.0,
            Normalization::Centered => (value - 127.0) / 128.0,
        }
    }
}

/// Expected input layout of a model, read from its NCHW input shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSpec {
    pub channels: usize,
    pub width: u32,
    pub height: u32,
}

/// Nearest-neighbour samples `region` of the frame into a
/// `[1, channels, height, width]` tensor.
///
/// With one channel the RGB pixels are converted to luma (BT.601).
pub fn region_to_tensor(
    frame: &Frame,
    region: &BoundingBox,
    input: InputSpec,
    norm: Normalization,
) -> Array4<f32> {
    let out_w = input.width.max(1) as usize;
    let out_h = input.height.max(1) as usize;
    let mut tensor = Array4::<f32>::zeros((1, input.channels, out_h, out_w));

    let src = frame.as_ndarray();
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    if src_w == 0 || src_h == 0 {
        return tensor;
    }
    let src_c = frame.channels() as usize;

    let step_x = region.width / out_w as f64;
    let step_y = region.height / out_h as f64;

    for y in 0..out_h {
        let sy = ((region.y + (y as f64 + 0.5) * step_y) as usize).min(src_h - 1);
        for x in 0..out_w {
            let sx = ((region.x + (x as f64 + 0.5) * step_x) as usize).min(src_w - 1);
            let rgb = [
                src[[sy, sx, 0]] as f32,
                src[[sy, sx, 1.min(src_c - 1)]] as f32,
                src[[sy, sx, 2.min(src_c - 1)]] as f32,
            ];
            if input.channels == 1 {
                let luma = 0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2];
                tensor[[0, 0, y, x]] = norm.apply(luma);
            } else {
                for (c, value) in rgb.iter().enumerate().take(input.channels) {
                    tensor[[0, c, y, x]] = norm.apply(*value);
                }
            }
        }
    }

    tensor
}

/// Samples the whole frame.
pub fn frame_to_tensor(frame: &Frame, input: InputSpec, norm: Normalization) -> Array4<f32> {
    let full = BoundingBox::new(0.0, 0.0, frame.width() as f64, frame.height() as f64);
    region_to_tensor(frame, &full, input, norm)
}
