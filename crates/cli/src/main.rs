use std::path::PathBuf;
use std::process;

use clap::Parser;

use gridline_core::checkpoint::infrastructure::json_checkpoint_store::JsonCheckpointStore;
use gridline_core::overlay::infrastructure::rule_of_thirds_overlay::{
    OverlayStyle, RuleOfThirdsOverlay,
};
use gridline_core::pipeline::checkpoint_resolver::CheckpointResolver;
use gridline_core::pipeline::overlay_video_use_case::{OverlayVideoUseCase, RunConfig, RunOutcome};
use gridline_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use gridline_core::pipeline::process_video_use_case::ProcessVideoUseCase;
use gridline_core::pipeline::remux_audio_use_case::RemuxAudioUseCase;
use gridline_core::remux::infrastructure::ffmpeg_cli_muxer::FfmpegCliMuxer;
use gridline_core::shared::constants::{DEFAULT_GUIDE_THICKNESS, DEFAULT_PROGRESS_EVERY};
use gridline_core::shared::run_paths::RunPaths;
use gridline_core::video::infrastructure::ffmpeg_frame_counter::FfmpegFrameCounter;
use gridline_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use gridline_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Draws rule-of-thirds guide lines on every frame of a video.
///
/// Writes `output_<name>` (video only) and `final_<name>` (with the original
/// audio) next to the input. An interrupted run can be picked up again with
/// `--continue`.
#[derive(Parser)]
#[command(name = "gridline")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Resume from the last committed output instead of starting over.
    #[arg(long = "continue", visible_alias = "resume")]
    resume: bool,

    /// Guide line thickness in pixels.
    #[arg(long, default_value_t = DEFAULT_GUIDE_THICKNESS)]
    thickness: u32,

    /// Guide line color as R,G,B.
    #[arg(long, default_value = "255,255,255", value_parser = parse_color)]
    color: [u8; 3],

    /// Stop after the video-only output; do not reattach audio.
    ///
    /// Needed for sources whose audio track is shorter than the video: the
    /// remux stops at the end of the audio, the final file comes out short,
    /// and every run fails the same way until this flag is passed.
    #[arg(long)]
    skip_audio: bool,

    /// ffmpeg binary used for the audio remux (default: `ffmpeg` on PATH).
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Log progress every N frames.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    progress_every: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let paths = RunPaths::for_input(&cli.input)?;
    let overlay = RuleOfThirdsOverlay::new(OverlayStyle {
        color: cli.color,
        thickness: cli.thickness,
    })?;
    let muxer = FfmpegCliMuxer::new(cli.ffmpeg.clone());
    log::debug!("Using {} for audio remux", muxer.binary().display());

    let mut use_case = OverlayVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        CheckpointResolver::new(
            Box::new(FfmpegFrameCounter),
            Box::new(JsonCheckpointStore::new(&paths.checkpoint)),
        ),
        ProcessVideoUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            Box::new(overlay),
            Box::new(JsonCheckpointStore::new(&paths.checkpoint)),
        ),
        RemuxAudioUseCase::new(Box::new(muxer), Box::new(FfmpegFrameCounter)),
    );

    let config = RunConfig {
        paths,
        resume: cli.resume,
        skip_audio: cli.skip_audio,
    };
    let mut logger = StdoutPipelineLogger::new(cli.progress_every);
    let result = use_case.execute(&config, &mut logger);
    logger.summary();

    match result? {
        RunOutcome::AlreadyComplete { frames } => log::info!(
            "Nothing to do: {} is complete ({frames} frames)",
            config.paths.final_output.display()
        ),
        RunOutcome::VideoOnly { frames } => log::info!(
            "Video-only output written to {} ({frames} frames)",
            config.paths.output.display()
        ),
        RunOutcome::Finalized { frames } => log::info!(
            "Output written to {} ({frames} frames)",
            config.paths.final_output.display()
        ),
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_file() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.thickness == 0 {
        return Err("Thickness must be at least 1 pixel".into());
    }
    if cli.progress_every == 0 {
        return Err("--progress-every must be at least 1".into());
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        if !ffmpeg.is_file() {
            return Err(format!("ffmpeg binary not found: {}", ffmpeg.display()).into());
        }
    }
    Ok(())
}

fn parse_color(value: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected R,G,B, got '{value}'"));
    }
    let mut rgb = [0u8; 3];
    for (channel, part) in rgb.iter_mut().zip(&parts) {
        *channel = part
            .parse()
            .map_err(|_| format!("'{part}' is not a channel value between 0 and 255"))?;
    }
    Ok(rgb)
}
