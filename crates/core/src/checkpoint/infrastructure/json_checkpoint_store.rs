use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::checkpoint::domain::checkpoint_record::CheckpointRecord;
use crate::checkpoint::domain::checkpoint_store::CheckpointStore;
use crate::shared::durable_fs;

/// Stores the checkpoint record as pretty-printed JSON next to the output.
///
/// Saves go through `<path>.tmp`: written, fsynced, then renamed over the
/// previous record.
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Result<Option<CheckpointRecord>, Box<dyn std::error::Error>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&self, record: &CheckpointRecord) -> Result<(), Box<dyn std::error::Error>> {
        let temp = self.temp_path();
        let json = serde_json::to_string_pretty(record)?;
        {
            let mut file = File::create(&temp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        durable_fs::sync_parent_dir(&self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), Box<dyn std::error::Error>> {
        durable_fs::remove_if_exists(&self.temp_path())?;
        durable_fs::remove_if_exists(&self.path)?;
        Ok(())
    }
}
