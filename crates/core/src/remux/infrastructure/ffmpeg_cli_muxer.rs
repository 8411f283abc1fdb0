use std::path::{Path, PathBuf};
use std::process::Command;

use crate::remux::domain::audio_muxer::AudioMuxer;
use crate::shared::constants::FFMPEG_BINARY;

/// Runs the `ffmpeg` command-line tool as a subprocess.
///
/// Maps the first video stream of the video-only file and the first audio
/// stream of the original, if it has one. A source without audio yields a
/// video-only deliverable rather than an error.
pub struct FfmpegCliMuxer {
    binary: PathBuf,
}

impl FfmpegCliMuxer {
    /// Uses `binary` if given, otherwise looks `ffmpeg` up on `PATH`.
    ///
    /// A binary that cannot be found only fails once `mux` runs, so a run
    /// that never remuxes does not need ffmpeg installed.
    pub fn new(binary: Option<PathBuf>) -> Self {
        let binary = binary.unwrap_or_else(|| match which::which(FFMPEG_BINARY) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{FFMPEG_BINARY} not found on PATH ({e}); audio remux will fail");
                PathBuf::from(FFMPEG_BINARY)
            }
        });
        Self { binary }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, video_only: &Path, original: &Path, final_path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-y", "-v", "error", "-i"])
            .arg(video_only)
            .arg("-i")
            .arg(original)
            .args(["-map", "0:v:0", "-map", "1:a?", "-c", "copy", "-shortest"])
            .arg(final_path);
        cmd
    }
}

impl AudioMuxer for FfmpegCliMuxer {
    fn mux(
        &self,
        video_only: &Path,
        original: &Path,
        final_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut cmd = self.command(video_only, original, final_path);
        log::debug!("Running {cmd:?}");

        let output = cmd
            .output()
            .map_err(|e| format!("failed to run {}: {e}", self.binary.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )
            .into());
        }
        Ok(())
    }
}
