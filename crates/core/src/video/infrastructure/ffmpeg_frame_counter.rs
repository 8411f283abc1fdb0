use std::path::Path;

use crate::video::domain::frame_counter::FrameCounter;

/// Counts video packets in a container without decoding them.
///
/// For the intra/inter coded streams this tool writes, one packet carries
/// one frame. Packet counting is used rather than the container's
/// `nb_frames` field, which is missing or stale in files that were not
/// finalised cleanly.
pub struct FfmpegFrameCounter;

impl FrameCounter for FfmpegFrameCounter {
    fn count_frames(&self, path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let video_index = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?
            .index();

        let count = ictx
            .packets()
            .filter(|(stream, _)| stream.index() == video_index)
            .count();

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_test_clip;

    #[test]
    fn test_counts_frames_of_clip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        write_test_clip(&path, 7, 64, 48, 30);

        assert_eq!(FfmpegFrameCounter.count_frames(&path).unwrap(), 7);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FfmpegFrameCounter
            .count_frames(&dir.path().join("absent.mp4"))
            .is_err());
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"definitely not a video").unwrap();

        assert!(FfmpegFrameCounter.count_frames(&path).is_err());
    }
}
