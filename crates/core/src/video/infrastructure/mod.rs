pub mod ffmpeg_frame_counter;
pub mod ffmpeg_reader;
pub mod ffmpeg_writer;
