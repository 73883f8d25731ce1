//! Write-temp-then-rename helpers so readers never observe a half-written
//! JSON file (§4.1 "Atomicity contract").

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
    }
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, &bytes).map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
    fs::rename(&tmp_path, path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = fs::read(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
}

pub fn read_json_or_default<T: serde::de::DeserializeOwned + Default>(
    path: &Path,
) -> Result<T, StoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("data");
    tmp.set_file_name(format!("{file_name}.tmp"));
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sample.json");
        write_json_atomic(&path, &Sample { value: 7 }).expect("write");
        let back: Sample = read_json(&path).expect("read");
        assert_eq!(back, Sample { value: 7 });
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");
        let value: Sample = read_json_or_default(&path).expect("read default");
        assert_eq!(value, Sample::default());
    }

    #[test]
    fn no_tmp_file_left_behind_after_write() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sample.json");
        write_json_atomic(&path, &Sample { value: 1 }).expect("write");
        assert!(!dir.path().join("sample.json.tmp").exists());
    }
}
