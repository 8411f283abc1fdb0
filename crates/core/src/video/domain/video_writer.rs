use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Append-only video encoding, independent of any codec library.
///
/// `open` truncates `path`. Frames are appended in call order and nothing
/// is guaranteed to be readable until `close` returns successfully.
pub trait VideoWriter: Send {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes buffered frames and finalises the container.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
