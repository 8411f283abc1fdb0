pub mod checkpoint_resolver;
pub mod overlay_video_use_case;
pub mod pipeline_logger;
pub mod process_video_use_case;
pub mod remux_audio_use_case;
