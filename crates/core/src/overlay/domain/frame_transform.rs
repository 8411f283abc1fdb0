use crate::shared::frame::Frame;

/// Pure per-frame transform applied between decode and encode.
///
/// Implementations modify the frame in place and must not carry state from
/// one frame to the next: resumed runs call them on an arbitrary suffix of
/// the sequence and must produce the same pixels as an uninterrupted run.
pub trait FrameTransform: Send {
    fn apply(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>>;
}
