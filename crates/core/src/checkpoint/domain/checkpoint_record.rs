use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::constants::CHECKPOINT_VERSION;

/// Durable description of the last promoted video-only artifact.
///
/// Written after every promotion and read back as the source of truth for
/// where to resume. Promotion only happens once the source is exhausted, so
/// `committed_frames` is the number of frames the source really decoded to.
/// The record is only trusted while the artifact on disk still has exactly
/// the recorded length and digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub version: u32,
    pub source: PathBuf,
    /// Container-reported frame count of the source at the time of the run.
    pub source_frames: usize,
    pub committed_frames: usize,
    pub artifact_len: u64,
    pub artifact_sha256: String,
}

impl CheckpointRecord {
    pub fn new(
        source: &Path,
        source_frames: usize,
        committed_frames: usize,
        (artifact_len, artifact_sha256): (u64, String),
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            source: source.to_path_buf(),
            source_frames,
            committed_frames,
            artifact_len,
            artifact_sha256,
        }
    }

    /// Why this record cannot vouch for the given artifact, if it can't.
    pub fn mismatch(
        &self,
        source: &Path,
        source_frames: usize,
        artifact: &(u64, String),
    ) -> Option<String> {
        if self.version != CHECKPOINT_VERSION {
            return Some(format!("unsupported checkpoint version {}", self.version));
        }
        if self.source != source {
            return Some(format!(
                "checkpoint belongs to {}, not {}",
                self.source.display(),
                source.display()
            ));
        }
        if self.source_frames != source_frames {
            return Some(format!(
                "source reported {} frames when checkpointed, now {}",
                self.source_frames, source_frames
            ));
        }
        if self.artifact_len != artifact.0 || self.artifact_sha256 != artifact.1 {
            return Some("video-only artifact changed since it was checkpointed".to_string());
        }
        None
    }
}
