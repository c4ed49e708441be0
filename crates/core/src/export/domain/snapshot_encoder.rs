use crate::shared::frame::Frame;

/// An encoded still of the live video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// File extension of `bytes`, without the dot.
    pub extension: &'static str,
}

/// Encodes a frame into a downloadable image.
pub trait SnapshotEncoder: Send {
    fn encode(&self, frame: &Frame) -> Result<Snapshot, Box<dyn std::error::Error>>;

    /// File extension of the encoded format, without the dot.
    fn extension(&self) -> &'static str;
}
