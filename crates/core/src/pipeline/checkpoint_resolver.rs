use std::path::Path;

use crate::checkpoint::domain::checkpoint_record::CheckpointRecord;
use crate::checkpoint::domain::checkpoint_store::CheckpointStore;
use crate::shared::durable_fs;
use crate::shared::error::RunError;
use crate::shared::run_paths::RunPaths;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_counter::FrameCounter;

use super::pipeline_logger::PipelineLogger;

/// What an invocation still has to do for a given input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumePlan {
    /// Frames of the video-only output that are already committed.
    pub start_frame: usize,
    /// Frame total the run is measured against: the checkpointed count when
    /// a trusted record exists, otherwise the source's reported count. Zero
    /// without a trusted record means the total is unknown.
    pub total_frames: usize,
    pub need_processing: bool,
    pub need_remux: bool,
    pub done: bool,
}

/// Decides where a run starts by inspecting durable state only.
///
/// Reads promoted artifacts and the checkpoint record; never trusts the
/// staging artifact, which it deletes before anything else happens.
pub struct CheckpointResolver {
    counter: Box<dyn FrameCounter>,
    store: Box<dyn CheckpointStore>,
}

impl CheckpointResolver {
    pub fn new(counter: Box<dyn FrameCounter>, store: Box<dyn CheckpointStore>) -> Self {
        Self { counter, store }
    }

    pub fn resolve(
        &self,
        metadata: &VideoMetadata,
        paths: &RunPaths,
        resume: bool,
        logger: &mut dyn PipelineLogger,
    ) -> Result<ResumePlan, RunError> {
        self.discard_staging(paths, logger)?;

        if !resume {
            return Ok(ResumePlan {
                start_frame: 0,
                total_frames: metadata.total_frames,
                need_processing: true,
                need_remux: true,
                done: false,
            });
        }

        let output_exists = paths.output.exists();
        let trusted = if output_exists {
            self.trusted_record(metadata, paths, logger)?
        } else {
            None
        };
        let total_frames = trusted
            .as_ref()
            .map_or(metadata.total_frames, |r| r.committed_frames);

        // Containers such as Matroska do not store a frame count. Without a
        // record nothing proves the output or the final artifact complete, so
        // the pass runs again from the readable end of the output.
        if trusted.is_none() && total_frames == 0 {
            self.discard_unverifiable_final(paths, logger)?;
            let start_frame = if output_exists {
                self.count_or_zero(&paths.output, logger)
            } else {
                0
            };
            return Ok(ResumePlan {
                start_frame,
                total_frames,
                need_processing: true,
                need_remux: true,
                done: false,
            });
        }

        if self.final_is_complete(paths, total_frames, logger)? {
            return Ok(ResumePlan {
                start_frame: total_frames,
                total_frames,
                need_processing: false,
                need_remux: false,
                done: true,
            });
        }

        let committed = match (&trusted, output_exists) {
            (_, false) => 0,
            (Some(record), true) => record.committed_frames,
            (None, true) => self.count_or_zero(&paths.output, logger),
        };
        let start_frame = committed.min(total_frames);

        Ok(ResumePlan {
            start_frame,
            total_frames,
            need_processing: !(output_exists && start_frame == total_frames),
            need_remux: true,
            done: false,
        })
    }

    fn discard_staging(
        &self,
        paths: &RunPaths,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), RunError> {
        let removed = durable_fs::remove_if_exists(&paths.staging)
            .map_err(|e| RunError::write(&paths.staging, e))?;
        if removed {
            logger.info(&format!(
                "Discarded unfinished staging artifact {}",
                paths.staging.display()
            ));
        }
        Ok(())
    }

    /// Returns the checkpoint record if it still describes the output on disk.
    fn trusted_record(
        &self,
        metadata: &VideoMetadata,
        paths: &RunPaths,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Option<CheckpointRecord>, RunError> {
        let record = match self.store.load() {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                logger.warn(&format!(
                    "Ignoring unreadable checkpoint {}: {e}",
                    paths.checkpoint.display()
                ));
                self.drop_stale_record(paths);
                return Ok(None);
            }
        };

        let artifact = durable_fs::sha256_file(&paths.output)
            .map_err(|e| RunError::checkpoint(&paths.output, e))?;

        match record.mismatch(&paths.input, metadata.total_frames, &artifact) {
            None => Ok(Some(record)),
            Some(reason) => {
                logger.warn(&format!(
                    "Not trusting checkpoint {}: {reason}; falling back to the output's frame count",
                    paths.checkpoint.display()
                ));
                self.drop_stale_record(paths);
                Ok(None)
            }
        }
    }

    /// The next promotion rewrites the record anyway, so failing to remove a
    /// stale one is only logged.
    fn drop_stale_record(&self, paths: &RunPaths) {
        if let Err(e) = self.store.clear() {
            log::warn!(
                "Could not remove stale checkpoint {}: {e}",
                paths.checkpoint.display()
            );
        }
    }

    /// True when the final deliverable already holds every frame. A short or
    /// unreadable one is deleted so it can never pass as finished.
    fn final_is_complete(
        &self,
        paths: &RunPaths,
        total_frames: usize,
        logger: &mut dyn PipelineLogger,
    ) -> Result<bool, RunError> {
        if !paths.final_output.exists() {
            return Ok(false);
        }

        let reason = match self.counter.count_frames(&paths.final_output) {
            Ok(count) if count >= total_frames => return Ok(true),
            Ok(count) => format!("holds {count} of {total_frames} frames"),
            Err(e) => format!("is unreadable ({e})"),
        };

        logger.warn(&format!(
            "Final output {} {reason}; deleting it",
            paths.final_output.display()
        ));
        durable_fs::remove_if_exists(&paths.final_output)
            .map_err(|e| RunError::write(&paths.final_output, e))?;
        Ok(false)
    }

    fn discard_unverifiable_final(
        &self,
        paths: &RunPaths,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), RunError> {
        let removed = durable_fs::remove_if_exists(&paths.final_output)
            .map_err(|e| RunError::write(&paths.final_output, e))?;
        if removed {
            logger.warn(&format!(
                "Source reports no frame count; cannot verify {}, deleting it",
                paths.final_output.display()
            ));
        }
        Ok(())
    }

    fn count_or_zero(&self, path: &Path, logger: &mut dyn PipelineLogger) -> usize {
        match self.counter.count_frames(path) {
            Ok(count) => count,
            Err(e) => {
                logger.warn(&format!(
                    "Cannot read {} ({e}); starting from frame 0",
                    path.display()
                ));
                0
            }
        }
    }
}
