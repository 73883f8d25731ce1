//! Append-only diagnostic log (`log.jsonl`), size-rotated.
//!
//! Purely diagnostic: replay on restart is driven by spans and actions, not
//! by this file (§3 "Log entry"). Rotation idiom adapted from the teacher's
//! `rotate_bak_path` (`storage/snapshot.rs`), renamed for `.jsonl` siblings
//! instead of `.bak` siblings.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rover_core::{ActionId, ActionKind, SpanId, Step, TraceId};

use crate::error::StoreError;

/// Rotate once the active log reaches this size.
pub const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
/// Keep this many rotated copies (`log.1.jsonl` .. `log.3.jsonl`).
const MAX_ROTATED: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub ts_ms: i64,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub action_id: Option<ActionId>,
    pub step: Step,
    pub action: Option<ActionKind>,
    pub summary: String,
}

pub struct RotatingLog {
    path: PathBuf,
    rotate_at_bytes: u64,
    max_rotated: u32,
}

impl RotatingLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path, rotate_at_bytes: ROTATE_AT_BYTES, max_rotated: MAX_ROTATED }
    }

    /// Used by the daemon's layered config (§4.13) to override the defaults.
    pub fn with_limits(path: PathBuf, rotate_at_bytes: u64, max_rotated: u32) -> Self {
        Self { path, rotate_at_bytes, max_rotated }
    }

    #[cfg(test)]
    pub fn with_limit(path: PathBuf, rotate_at_bytes: u64) -> Self {
        Self::with_limits(path, rotate_at_bytes, MAX_ROTATED)
    }

    /// Appends one line. Rotates first if the current file has already
    /// crossed the configured limit, so a single append never itself
    /// produces an oversized file by more than one line.
    pub fn append(&self, entry: &LogEntry) -> Result<(), StoreError> {
        if self.current_size()? >= self.rotate_at_bytes {
            self.rotate()?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
        let mut line = serde_json::to_string(entry)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        line.push('\n');
        file.write_all(line.as_bytes())
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
        Ok(())
    }

    fn current_size(&self) -> Result<u64, StoreError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(source) => Err(StoreError::Io { path: self.path.clone(), source }),
        }
    }

    fn rotated_path(&self, n: u32) -> PathBuf {
        let stem = self.path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
        self.path.with_file_name(format!("{stem}.{n}.jsonl"))
    }

    /// Shifts `log.2.jsonl` -> `log.3.jsonl`, `log.1.jsonl` -> `log.2.jsonl`,
    /// dropping whatever was at the oldest slot, then moves the active log
    /// into `log.1.jsonl` and starts a fresh empty active log.
    fn rotate(&self) -> Result<(), StoreError> {
        let oldest = self.rotated_path(self.max_rotated);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(|source| StoreError::Io { path: oldest, source })?;
        }
        for n in (1..self.max_rotated).rev() {
            let src = self.rotated_path(n);
            if src.exists() {
                let dst = self.rotated_path(n + 1);
                fs::rename(&src, &dst).map_err(|source| StoreError::Io { path: src, source })?;
            }
        }
        if self.path.exists() {
            let dst = self.rotated_path(1);
            fs::rename(&self.path, &dst).map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
        }
        Ok(())
    }
}

/// Ensures the file exists (zero-length) so `current_size` observes a real
/// file rather than repeatedly hitting the not-found branch on an idle log.
pub fn ensure_log_file(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }
        File::create(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
