pub mod constants;
pub mod durable_fs;
pub mod error;
pub mod frame;
pub mod run_paths;
pub mod video_metadata;
