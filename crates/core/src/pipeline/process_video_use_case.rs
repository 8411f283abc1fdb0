use std::time::Instant;

use crate::checkpoint::domain::checkpoint_record::CheckpointRecord;
use crate::checkpoint::domain::checkpoint_store::CheckpointStore;
use crate::overlay::domain::frame_transform::FrameTransform;
use crate::shared::durable_fs;
use crate::shared::error::RunError;
use crate::shared::run_paths::RunPaths;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::PipelineLogger;

/// Result of one processing pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Frames in the promoted output.
    pub committed_frames: usize,
    /// How many of those were copied from the previous output.
    pub carried_frames: usize,
}

/// Produces the video-only output: previously committed frames carried over,
/// the rest of the source transformed, all written to staging and promoted
/// in one step.
///
/// Single-use: `execute` consumes the carry reader and the writer.
pub struct ProcessVideoUseCase {
    carry_reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    transform: Box<dyn FrameTransform>,
    store: Box<dyn CheckpointStore>,
}

impl ProcessVideoUseCase {
    pub fn new(
        carry_reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        transform: Box<dyn FrameTransform>,
        store: Box<dyn CheckpointStore>,
    ) -> Self {
        Self {
            carry_reader: Some(carry_reader),
            writer: Some(writer),
            transform,
            store,
        }
    }

    /// Runs the pass against an already opened `source`.
    ///
    /// On error the staging artifact is left as is and nothing is promoted;
    /// `paths.output` keeps whatever the last successful pass produced.
    pub fn execute(
        &mut self,
        source: &mut dyn VideoReader,
        metadata: &VideoMetadata,
        start_frame: usize,
        paths: &RunPaths,
        logger: &mut dyn PipelineLogger,
    ) -> Result<ProcessOutcome, RunError> {
        let mut writer = self.writer.take().ok_or(RunError::AlreadyExecuted)?;
        let mut carry_reader = self.carry_reader.take().ok_or(RunError::AlreadyExecuted)?;

        writer
            .open(&paths.staging, metadata)
            .map_err(|e| RunError::write(&paths.staging, e))?;

        let carried_frames = if start_frame > 0 {
            carry_forward(
                carry_reader.as_mut(),
                writer.as_mut(),
                metadata,
                start_frame,
                paths,
                logger,
            )?
        } else {
            0
        };
        logger.metric("carried_frames", carried_frames as f64);

        // Continue from what was actually carried so a short copy never
        // skips source frames.
        source
            .seek(carried_frames)
            .map_err(|e| RunError::read(&paths.input, e))?;

        let mut committed = carried_frames;
        let mut frames = source.frames();
        loop {
            let decode_start = Instant::now();
            let Some(next) = frames.next() else {
                break;
            };
            let mut frame = next
                .map_err(|e| RunError::read(&paths.input, e))?
                .reindexed(committed);
            logger.timing("decode", elapsed_ms(decode_start));

            let transform_start = Instant::now();
            self.transform
                .apply(&mut frame)
                .map_err(|e| RunError::Transform {
                    index: frame.index(),
                    source: e,
                })?;
            logger.timing("transform", elapsed_ms(transform_start));

            let encode_start = Instant::now();
            writer
                .write(&frame)
                .map_err(|e| RunError::write(&paths.staging, e))?;
            logger.timing("encode", elapsed_ms(encode_start));

            committed += 1;
            logger.progress(committed, metadata.total_frames);
        }
        drop(frames);

        if committed != metadata.total_frames {
            logger.info(&format!(
                "Source ended after {committed} frames (container reported {})",
                metadata.total_frames
            ));
        }

        source.close();
        writer
            .close()
            .map_err(|e| RunError::write(&paths.staging, e))?;

        durable_fs::promote(&paths.staging, &paths.output)
            .map_err(|e| RunError::write(&paths.output, e))?;

        let artifact = durable_fs::sha256_file(&paths.output)
            .map_err(|e| RunError::checkpoint(&paths.output, e))?;
        let record =
            CheckpointRecord::new(&paths.input, metadata.total_frames, committed, artifact);
        self.store
            .save(&record)
            .map_err(|e| RunError::checkpoint(&paths.checkpoint, e))?;

        logger.info(&format!(
            "Committed {committed} frames to {}",
            paths.output.display()
        ));

        Ok(ProcessOutcome {
            committed_frames: committed,
            carried_frames,
        })
    }
}

/// Copies the first `start_frame` frames of the current output into staging.
///
/// Returns how many frames were copied. Fewer readable frames than expected
/// is reported as a warning, not an error: container frame counts can
/// overstate what actually decodes.
fn carry_forward(
    reader: &mut dyn VideoReader,
    writer: &mut dyn VideoWriter,
    metadata: &VideoMetadata,
    start_frame: usize,
    paths: &RunPaths,
    logger: &mut dyn PipelineLogger,
) -> Result<usize, RunError> {
    let carried_meta = match reader.open(&paths.output) {
        Ok(meta) => meta,
        Err(e) => {
            logger.warn(&format!(
                "Could not open {} to carry {start_frame} frames forward ({e}); starting over",
                paths.output.display()
            ));
            return Ok(0);
        }
    };
    if carried_meta.width != metadata.width || carried_meta.height != metadata.height {
        logger.warn(&format!(
            "{} is {}x{} but the source is {}x{}; starting over",
            paths.output.display(),
            carried_meta.width,
            carried_meta.height,
            metadata.width,
            metadata.height
        ));
        reader.close();
        return Ok(0);
    }

    let mut copied = 0;
    let mut short_reason = None;
    for next in reader.frames().take(start_frame) {
        let copy_start = Instant::now();
        let frame = match next {
            Ok(frame) => frame.reindexed(copied),
            Err(e) => {
                short_reason = Some(e.to_string());
                break;
            }
        };
        writer
            .write(&frame)
            .map_err(|e| RunError::write(&paths.staging, e))?;
        logger.timing("carry", elapsed_ms(copy_start));
        copied += 1;
    }
    reader.close();

    if copied < start_frame {
        let reason = short_reason.unwrap_or_else(|| "end of file".to_string());
        logger.warn(&format!(
            "Only {copied} of {start_frame} committed frames are readable from {} ({reason}); \
             resuming from frame {copied}",
            paths.output.display()
        ));
    }
    Ok(copied)
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
