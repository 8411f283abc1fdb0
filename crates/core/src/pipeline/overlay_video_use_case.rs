use crate::shared::error::RunError;
use crate::shared::run_paths::RunPaths;
use crate::video::domain::video_reader::VideoReader;

use super::checkpoint_resolver::CheckpointResolver;
use super::pipeline_logger::PipelineLogger;
use super::process_video_use_case::ProcessVideoUseCase;
use super::remux_audio_use_case::RemuxAudioUseCase;

/// Per-invocation settings shared by every stage.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub paths: RunPaths,
    pub resume: bool,
    pub skip_audio: bool,
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The final deliverable already held every frame; nothing ran.
    AlreadyComplete { frames: usize },
    /// The video-only output is complete but no audio was attached.
    VideoOnly { frames: usize },
    /// The final deliverable was written.
    Finalized { frames: usize },
}

/// Resolves the resume point, processes the remaining frames and remuxes
/// the audio, in that order.
///
/// Single-use: `execute` consumes the source reader.
pub struct OverlayVideoUseCase {
    source: Option<Box<dyn VideoReader>>,
    resolver: CheckpointResolver,
    processor: ProcessVideoUseCase,
    remuxer: RemuxAudioUseCase,
}

impl OverlayVideoUseCase {
    pub fn new(
        source: Box<dyn VideoReader>,
        resolver: CheckpointResolver,
        processor: ProcessVideoUseCase,
        remuxer: RemuxAudioUseCase,
    ) -> Self {
        Self {
            source: Some(source),
            resolver,
            processor,
            remuxer,
        }
    }

    pub fn execute(
        &mut self,
        config: &RunConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<RunOutcome, RunError> {
        let paths = &config.paths;
        let mut source = self.source.take().ok_or(RunError::AlreadyExecuted)?;

        let metadata = source.open(&paths.input).map_err(|e| RunError::InputOpen {
            path: paths.input.clone(),
            source: e,
        })?;
        log::info!(
            "Input {}: {}x{} @ {:.2} fps, {} frames ({})",
            paths.input.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.codec
        );

        let plan = self
            .resolver
            .resolve(&metadata, paths, config.resume, logger)?;
        log::debug!("Resume plan: {plan:?}");

        if plan.done {
            source.close();
            logger.info(&format!(
                "{} already has all {} frames; nothing to do",
                paths.final_output.display(),
                plan.total_frames
            ));
            return Ok(RunOutcome::AlreadyComplete {
                frames: plan.total_frames,
            });
        }

        let committed = if plan.need_processing {
            if plan.start_frame > 0 {
                let of_total = match plan.total_frames {
                    0 => String::new(),
                    total => format!(" of {total}"),
                };
                logger.info(&format!("Resuming at frame {}{of_total}", plan.start_frame));
            }
            self.processor
                .execute(source.as_mut(), &metadata, plan.start_frame, paths, logger)?
                .committed_frames
        } else {
            source.close();
            logger.info(&format!(
                "{} already holds all {} frames; skipping to remux",
                paths.output.display(),
                plan.start_frame
            ));
            plan.start_frame
        };

        if config.skip_audio || !plan.need_remux {
            return Ok(RunOutcome::VideoOnly { frames: committed });
        }
        if committed == 0 {
            logger.warn("No frames were committed; skipping audio remux");
            return Ok(RunOutcome::VideoOnly { frames: 0 });
        }

        self.remuxer.execute(paths, committed, logger)?;
        Ok(RunOutcome::Finalized { frames: committed })
    }
}
