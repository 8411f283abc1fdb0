pub mod ffmpeg_cli_muxer;
