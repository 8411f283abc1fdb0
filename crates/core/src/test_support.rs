//! Fixtures shared by unit tests across the crate.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_counter::FrameCounter;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

type BoxError = Box<dyn std::error::Error>;

pub fn metadata(width: u32, height: u32, total_frames: usize) -> VideoMetadata {
    VideoMetadata {
        width,
        height,
        fps: 30.0,
        total_frames,
        codec: "raw".to_string(),
        source_path: None,
    }
}

/// Frame `index` of a synthetic source: a gradient that differs per index.
pub fn source_frame(index: usize, width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height as usize {
        for x in 0..width as usize {
            data.push(((index * 7 + x) % 256) as u8);
            data.push(((index * 3 + y) % 256) as u8);
            data.push((index % 256) as u8);
        }
    }
    Frame::new(data, width, height, 3, index)
}

pub fn source_frames(count: usize, width: u32, height: u32) -> Vec<Frame> {
    (0..count).map(|i| source_frame(i, width, height)).collect()
}

// --- Raw frame container ---
//
// Each record: width (u32 LE), height (u32 LE), channels (u8), pixel bytes.
// A truncated trailing record is ignored by the counter and reported as an
// error by the reader, like a container killed mid-write.

fn read_header(input: &mut impl Read) -> std::io::Result<Option<(u32, u32, u8)>> {
    let mut header = [0u8; 9];
    match input.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let width = u32::from_le_bytes(header[0..4].try_into().unwrap());
    let height = u32::from_le_bytes(header[4..8].try_into().unwrap());
    Ok(Some((width, height, header[8])))
}

pub struct RawFrameWriter {
    out: Option<BufWriter<File>>,
    fail_after: Option<usize>,
    written: usize,
}

impl RawFrameWriter {
    pub fn new() -> Self {
        Self {
            out: None,
            fail_after: None,
            written: 0,
        }
    }

    /// Simulates a kill or a full disk after `n` frames have been accepted.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new()
        }
    }
}

impl VideoWriter for RawFrameWriter {
    fn open(&mut self, path: &Path, _metadata: &VideoMetadata) -> Result<(), BoxError> {
        self.out = Some(BufWriter::new(File::create(path)?));
        self.written = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), BoxError> {
        if self.fail_after == Some(self.written) {
            if let Some(out) = self.out.as_mut() {
                out.flush()?;
            }
            return Err("No space left on device".into());
        }
        let out = self.out.as_mut().ok_or("RawFrameWriter: not opened")?;
        out.write_all(&frame.width().to_le_bytes())?;
        out.write_all(&frame.height().to_le_bytes())?;
        out.write_all(&[frame.channels()])?;
        out.write_all(frame.data())?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if let Some(mut out) = self.out.take() {
            out.flush()?;
        }
        Ok(())
    }
}

pub struct RawFrameReader {
    input: Option<BufReader<File>>,
    seek_to: usize,
}

impl RawFrameReader {
    pub fn new() -> Self {
        Self {
            input: None,
            seek_to: 0,
        }
    }
}

impl VideoReader for RawFrameReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, BoxError> {
        let total = RawFrameCounter.count_frames(path)?;
        let mut header_reader = BufReader::new(File::open(path)?);
        let (width, height) = match read_header(&mut header_reader)? {
            Some((w, h, _)) => (w, h),
            None => (0, 0),
        };
        self.input = Some(BufReader::new(File::open(path)?));
        self.seek_to = 0;
        Ok(VideoMetadata {
            source_path: Some(path.to_path_buf()),
            ..metadata(width, height, total)
        })
    }

    fn seek(&mut self, frame_index: usize) -> Result<(), BoxError> {
        self.seek_to = frame_index;
        Ok(())
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, BoxError>> + '_> {
        let skip = self.seek_to;
        let Some(input) = self.input.as_mut() else {
            return Box::new(std::iter::once(Err("RawFrameReader: not opened".into())));
        };
        let mut index = 0usize;
        let mut failed = false;
        let iter = std::iter::from_fn(move || {
            if failed {
                return None;
            }
            let result = (|| -> Result<Option<Frame>, BoxError> {
                let Some((w, h, c)) = read_header(input)? else {
                    return Ok(None);
                };
                let mut data = vec![0u8; w as usize * h as usize * c as usize];
                input.read_exact(&mut data)?;
                Ok(Some(Frame::new(data, w, h, c, index)))
            })();
            index += 1;
            match result {
                Ok(frame) => frame.map(Ok),
                Err(e) => {
                    failed = true;
                    Some(Err(e))
                }
            }
        });
        Box::new(iter.skip(skip))
    }

    fn close(&mut self) {
        self.input = None;
    }
}

pub struct RawFrameCounter;

impl FrameCounter for RawFrameCounter {
    fn count_frames(&self, path: &Path) -> Result<usize, BoxError> {
        let mut input = BufReader::new(File::open(path)?);
        let mut count = 0;
        while let Some((w, h, c)) = read_header(&mut input)? {
            let len = w as u64 * h as u64 * c as u64;
            let skipped = std::io::copy(&mut (&mut input).take(len), &mut std::io::sink())?;
            if skipped < len {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}

/// Writes frames to a raw container at `path` in one go.
pub fn write_raw(path: &Path, frames: &[Frame]) {
    let mut writer = RawFrameWriter::new();
    writer.open(path, &metadata(0, 0, 0)).unwrap();
    for frame in frames {
        writer.write(frame).unwrap();
    }
    writer.close().unwrap();
}

pub fn read_raw(path: &Path) -> Vec<Frame> {
    let mut reader = RawFrameReader::new();
    reader.open(path).unwrap();
    reader.frames().map(|f| f.unwrap()).collect()
}

// --- In-memory source ---

/// Source reader over in-memory frames; reports `reported_total` as the
/// container frame count, which may differ from the frames it really has.
pub struct StubReader {
    frames: Vec<Frame>,
    width: u32,
    height: u32,
    reported_total: usize,
    seek_to: usize,
    fail_at: Option<usize>,
    pub fail_open: bool,
    pub closed: Arc<Mutex<bool>>,
    pub seeks: Arc<Mutex<Vec<usize>>>,
}

impl StubReader {
    pub fn new(frames: Vec<Frame>, width: u32, height: u32) -> Self {
        let reported_total = frames.len();
        Self {
            frames,
            width,
            height,
            reported_total,
            seek_to: 0,
            fail_at: None,
            fail_open: false,
            closed: Arc::new(Mutex::new(false)),
            seeks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn reporting_total(mut self, total: usize) -> Self {
        self.reported_total = total;
        self
    }

    /// Yields a decode error in place of frame `index` and stops there.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl VideoReader for StubReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, BoxError> {
        if self.fail_open {
            return Err("moov atom not found".into());
        }
        Ok(VideoMetadata {
            source_path: Some(PathBuf::from(path)),
            ..metadata(self.width, self.height, self.reported_total)
        })
    }

    fn seek(&mut self, frame_index: usize) -> Result<(), BoxError> {
        self.seeks.lock().unwrap().push(frame_index);
        self.seek_to = frame_index;
        Ok(())
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, BoxError>> + '_> {
        let fail_at = self.fail_at;
        let frames = self.frames.iter().skip(self.seek_to).cloned().map(move |frame| {
            if Some(frame.index()) == fail_at {
                Err(BoxError::from("Invalid data found when processing input"))
            } else {
                Ok(frame)
            }
        });
        let mut failed = false;
        Box::new(frames.take_while(move |result| {
            let keep = !failed;
            failed |= result.is_err();
            keep
        }))
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() = true;
    }
}

// --- ffmpeg fixtures ---

/// Encodes a small MPEG-4 clip whose frames get brighter with the index.
pub fn write_test_clip(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();

    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
    let mut ost = octx.add_stream(Some(codec)).unwrap();

    let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();

    encoder_ctx.set_width(width);
    encoder_ctx.set_height(height);
    encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
    encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
    encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));

    if global_header {
        encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let mut encoder = encoder_ctx
        .open_with(ffmpeg_next::Dictionary::new())
        .unwrap();
    ost.set_parameters(&encoder);

    octx.write_header().unwrap();

    let ost_time_base = octx.stream(0).unwrap().time_base();

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::format::Pixel::YUV420P,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    let flush = |encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
                     octx: &mut ffmpeg_next::format::context::Output| {
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(octx).unwrap();
        }
    };

    for i in 0..num_frames {
        let mut rgb_frame =
            ffmpeg_next::util::frame::video::Video::new(ffmpeg_next::format::Pixel::RGB24, width, height);
        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data_mut(0);
        let value = ((i * 40) % 256) as u8;
        for row in 0..height as usize {
            for col in 0..width as usize {
                let offset = row * stride + col * 3;
                data[offset..offset + 3].fill(value);
            }
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
        yuv_frame.set_pts(Some(i as i64));

        encoder.send_frame(&yuv_frame).unwrap();
        flush(&mut encoder, &mut octx);
    }

    encoder.send_eof().unwrap();
    flush(&mut encoder, &mut octx);

    octx.write_trailer().unwrap();
}

pub fn ffmpeg_on_path() -> bool {
    which::which("ffmpeg").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_container_counts_complete_records_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.bin");
        write_raw(&path, &source_frames(3, 4, 2));

        let len = std::fs::metadata(&path).unwrap().len();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 5).unwrap();

        assert_eq!(RawFrameCounter.count_frames(&path).unwrap(), 2);
        let frames: Vec<_> = {
            let mut reader = RawFrameReader::new();
            reader.open(&path).unwrap();
            reader.frames().collect()
        };
        assert_eq!(frames.len(), 3);
        assert!(frames[2].is_err());
    }

    #[test]
    fn test_failing_writer_stops_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.bin");
        let mut writer = RawFrameWriter::failing_after(2);
        writer.open(&path, &metadata(4, 2, 5)).unwrap();
        let frames = source_frames(5, 4, 2);
        assert!(writer.write(&frames[0]).is_ok());
        assert!(writer.write(&frames[1]).is_ok());
        assert!(writer.write(&frames[2]).is_err());
    }
}
