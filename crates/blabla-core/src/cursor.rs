//! Durable storage for the update watermark (the next `offset` to request).

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const DEFAULT_CURSOR_FILE: &str = "blablabot_update_id.txt";

pub trait CursorStore: Send + Sync {
    /// Last saved watermark, or 0 when nothing was saved yet.
    fn load(&self) -> Result<i64>;

    fn save(&self, watermark: i64) -> Result<()>;
}

/// Watermark kept as decimal text in a single file.
#[derive(Clone, Debug)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CursorStore for FileCursorStore {
    fn load(&self) -> Result<i64> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(Error::store(&self.path, e)),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        match trimmed.parse::<i64>() {
            Ok(value) if value >= 0 => Ok(value),
            Ok(value) => Err(Error::store(
                &self.path,
                format!("negative watermark {value}"),
            )),
            Err(e) => Err(Error::store(
                &self.path,
                format!("invalid watermark {trimmed:?}: {e}"),
            )),
        }
    }

    fn save(&self, watermark: i64) -> Result<()> {
        write_atomic(&self.path, &watermark.to_string())
            .map_err(|e| Error::store(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), watermark, "watermark saved");
        Ok(())
    }
}

/// Temp file in the same directory, fsync, rename over the target.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("cursor");
    let temp_path = dir.join(format!(".{name}.tmp-{}", std::process::id()));

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}
