pub mod audio_muxer;
