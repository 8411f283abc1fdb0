pub mod frame_counter;
pub mod video_reader;
pub mod video_writer;
