use crate::remux::domain::audio_muxer::AudioMuxer;
use crate::shared::durable_fs;
use crate::shared::error::RunError;
use crate::shared::run_paths::RunPaths;
use crate::video::domain::frame_counter::FrameCounter;

use super::pipeline_logger::PipelineLogger;

/// Reattaches the original audio to the promoted video-only output.
///
/// All or nothing: on any failure the final deliverable is removed, while
/// the video-only output stays valid for a remux-only retry.
pub struct RemuxAudioUseCase {
    muxer: Box<dyn AudioMuxer>,
    counter: Box<dyn FrameCounter>,
}

impl RemuxAudioUseCase {
    pub fn new(muxer: Box<dyn AudioMuxer>, counter: Box<dyn FrameCounter>) -> Self {
        Self { muxer, counter }
    }

    /// Writes `paths.final_output` and checks it holds at least
    /// `expected_frames` frames.
    pub fn execute(
        &self,
        paths: &RunPaths,
        expected_frames: usize,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), RunError> {
        logger.info(&format!(
            "Remuxing audio from {} into {}",
            paths.input.display(),
            paths.final_output.display()
        ));

        if let Err(e) = self
            .muxer
            .mux(&paths.output, &paths.input, &paths.final_output)
        {
            return Err(self.fail(paths, e.to_string()));
        }

        match self.counter.count_frames(&paths.final_output) {
            Ok(count) if count >= expected_frames => {
                logger.info(&format!(
                    "Final output {} has {count} frames",
                    paths.final_output.display()
                ));
                Ok(())
            }
            Ok(count) => Err(self.fail(
                paths,
                format!("result holds {count} of {expected_frames} frames (audio track shorter than video?)"),
            )),
            Err(e) => Err(self.fail(paths, format!("result is unreadable: {e}"))),
        }
    }

    fn fail(&self, paths: &RunPaths, reason: String) -> RunError {
        if let Err(e) = durable_fs::remove_if_exists(&paths.final_output) {
            log::warn!(
                "Could not remove partial {}: {e}",
                paths.final_output.display()
            );
        }
        RunError::Remux {
            path: paths.final_output.clone(),
            reason,
        }
    }
}
