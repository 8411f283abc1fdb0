/// Prefix of the video-only durable artifact, next to the input.
pub const OUTPUT_PREFIX: &str = "output_";
/// Prefix of the transient staging artifact.
pub const STAGING_PREFIX: &str = "temp_output_";
/// Prefix of the final deliverable with audio.
pub const FINAL_PREFIX: &str = "final_";
/// Appended to the output file name to form the checkpoint record path.
pub const CHECKPOINT_SUFFIX: &str = ".progress";

pub const CHECKPOINT_VERSION: u32 = 1;

pub const DEFAULT_GUIDE_COLOR: [u8; 3] = [255, 255, 255];
pub const DEFAULT_GUIDE_THICKNESS: u32 = 2;

/// Progress is logged every N frames.
pub const DEFAULT_PROGRESS_EVERY: usize = 10;

pub const FFMPEG_BINARY: &str = "ffmpeg";
