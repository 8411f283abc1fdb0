use std::path::Path;

/// Combines the video stream of one file with the audio of another.
///
/// The result is trimmed to the shorter of the two streams and codecs are
/// copied, not re-encoded. A partially written `final_path` after an error
/// is the caller's to clean up.
pub trait AudioMuxer: Send {
    fn mux(
        &self,
        video_only: &Path,
        original: &Path,
        final_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
