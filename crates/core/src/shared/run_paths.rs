use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::shared::constants::{CHECKPOINT_SUFFIX, FINAL_PREFIX, OUTPUT_PREFIX, STAGING_PREFIX};

/// Every file a run touches, derived once from the input path.
///
/// All artifacts live next to the input and keep its file name (and so its
/// container extension) behind a fixed prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub staging: PathBuf,
    pub final_output: PathBuf,
    pub checkpoint: PathBuf,
}

impl RunPaths {
    pub fn for_input(input: &Path) -> Result<Self, String> {
        let name = input
            .file_name()
            .ok_or_else(|| format!("Input path has no file name: {}", input.display()))?;
        let dir = input.parent().unwrap_or_else(|| Path::new(""));

        let output = dir.join(prefixed(OUTPUT_PREFIX, name));
        let mut checkpoint_name = prefixed(OUTPUT_PREFIX, name);
        checkpoint_name.push(CHECKPOINT_SUFFIX);

        Ok(Self {
            input: input.to_path_buf(),
            staging: dir.join(prefixed(STAGING_PREFIX, name)),
            final_output: dir.join(prefixed(FINAL_PREFIX, name)),
            checkpoint: dir.join(checkpoint_name),
            output,
        })
    }
}

fn prefixed(prefix: &str, name: &std::ffi::OsStr) -> OsString {
    let mut out = OsString::from(prefix);
    out.push(name);
    out
}
