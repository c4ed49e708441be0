use image::codecs::jpeg::JpegEncoder;

use crate::export::domain::snapshot_encoder::{Snapshot, SnapshotEncoder};
use crate::shared::constants::SNAPSHOT_JPEG_QUALITY;
use crate::shared::frame::Frame;

/// JPEG snapshots via the `image` crate.
pub struct JpegSnapshotEncoder {
    quality: u8,
}

impl JpegSnapshotEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegSnapshotEncoder {
    fn default() -> Self {
        Self::new(SNAPSHOT_JPEG_QUALITY)
    }
}

impl SnapshotEncoder for JpegSnapshotEncoder {
    fn encode(&self, frame: &Frame) -> Result<Snapshot, Box<dyn std::error::Error>> {
        let img = frame
            .to_rgb_image()
            .ok_or("Failed to create image from frame data")?;

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode_image(&img)?;
        Ok(Snapshot {
            bytes,
            width: frame.width(),
            height: frame.height(),
            extension: self.extension(),
        })
    }

    fn extension(&self) -> &'static str {
        "jpg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb.repeat((width * height) as usize);
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_encodes_jpeg() {
        let snapshot = JpegSnapshotEncoder::default()
            .encode(&make_frame(32, 24, [200, 100, 50]))
            .unwrap();
        assert_eq!((snapshot.width, snapshot.height), (32, 24));
        // SOI marker
        assert_eq!(&snapshot.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(snapshot.extension, "jpg");
    }

    #[test]
    fn test_decodes_back_to_same_size_and_color() {
        let snapshot = JpegSnapshotEncoder::new(100)
            .encode(&make_frame(16, 16, [10, 200, 30]))
            .unwrap();
        let decoded = image::load_from_memory(&snapshot.bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 16));
        let px = decoded.get_pixel(8, 8).0;
        assert!((px[1] as i32 - 200).abs() < 8);
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(JpegSnapshotEncoder::new(0).quality, 1);
        assert_eq!(JpegSnapshotEncoder::new(255).quality, 100);
    }

    #[test]
    fn test_non_rgb_frame_is_error() {
        let frame = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        assert!(JpegSnapshotEncoder::default().encode(&frame).is_err());
    }
}
