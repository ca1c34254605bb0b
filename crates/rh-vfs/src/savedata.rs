//! SRAM files and save-state slots
//!
//! Writes go to a sibling `*.tmp` file first and are renamed into place,
//! so a crash mid-write never leaves a truncated save behind.

use crate::paths::{content_name, HostPaths};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of save-state slot files
pub const STATE_EXTENSION: &str = "state";

/// Write `data` to `path` atomically, creating parent directories
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, data)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Read the first of `candidates` that exists
pub fn read_first_existing(candidates: &[PathBuf]) -> io::Result<Option<(PathBuf, Vec<u8>)>> {
    for path in candidates {
        match std::fs::read(path) {
            Ok(data) => return Ok(Some((path.clone(), data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Numbered save-state slots for one piece of content
#[derive(Debug, Clone)]
pub struct SaveStateStore {
    name: String,
    dir: PathBuf,
}

impl SaveStateStore {
    /// Store under `states/<content name>/`
    pub fn new(paths: &HostPaths, content: &Path) -> Self {
        Self {
            name: content_name(content),
            dir: paths.states_dir(content),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.dir.join(format!("{}.{}", slot, STATE_EXTENSION))
    }

    /// Write a blob to `slot`, replacing any previous one
    pub fn save(&self, slot: u32, blob: &[u8]) -> io::Result<PathBuf> {
        let path = self.slot_path(slot);
        write_atomic(&path, blob)?;
        tracing::info!("Saved state slot {} ({} bytes) to {}", slot, blob.len(), path.display());
        Ok(path)
    }

    /// Read a slot back verbatim. A missing slot is `None`.
    pub fn load(&self, slot: u32) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.slot_path(slot)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn delete(&self, slot: u32) -> io::Result<()> {
        match std::fs::remove_file(self.slot_path(slot)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Occupied slots in ascending order
    pub fn slots(&self) -> Vec<u32> {
        let mut slots: Vec<u32> = std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|entry| {
                        let path = entry.path();
                        if path.extension()? != OsStr::new(STATE_EXTENSION) {
                            return None;
                        }
                        path.file_stem()?.to_str()?.parse().ok()
                    })
                    .collect()
            })
            .unwrap_or_default();
        slots.sort_unstable();
        slots
    }

    /// Display name the store is keyed by
    pub fn name(&self) -> &str {
        &self.name
    }
}
