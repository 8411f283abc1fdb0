use std::path::Path;

/// Reports how many video frames an existing file holds.
///
/// Used to find the resume point of a video-only artifact and to check that
/// a final deliverable is not short. An unreadable file is an error, not
/// zero; callers decide how to treat it.
pub trait FrameCounter: Send {
    fn count_frames(&self, path: &Path) -> Result<usize, Box<dyn std::error::Error>>;
}
