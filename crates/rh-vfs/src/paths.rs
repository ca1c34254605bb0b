//! Deterministic host directories

use rh_core::ConsoleProfile;
use std::io;
use std::path::{Path, PathBuf};

/// Directory layout rooted at the documents directory
#[derive(Debug, Clone)]
pub struct HostPaths {
    documents: PathBuf,
}

impl HostPaths {
    pub fn new(documents: impl Into<PathBuf>) -> Self {
        Self {
            documents: documents.into(),
        }
    }

    pub fn documents(&self) -> &Path {
        &self.documents
    }

    /// `<documents>/system`, created if missing
    pub fn system_dir(&self) -> io::Result<PathBuf> {
        ensure_dir(self.documents.join("system"))
    }

    /// `<documents>/saves/<console>`, created if missing
    pub fn save_dir(&self, profile: &ConsoleProfile) -> io::Result<PathBuf> {
        ensure_dir(self.documents.join("saves").join(profile.save_dir))
    }

    /// `<documents>/states/<content name>`; not created until a state is written
    pub fn states_dir(&self, content: &Path) -> PathBuf {
        self.documents.join("states").join(content_name(content))
    }

    /// File the SRAM of `content` is written to
    pub fn sram_write_path(&self, profile: &ConsoleProfile, content: &Path) -> PathBuf {
        self.sram_file(profile, content, profile.sram_write_ext)
    }

    /// Files tried, in order, when restoring the SRAM of `content`
    pub fn sram_read_paths(&self, profile: &ConsoleProfile, content: &Path) -> Vec<PathBuf> {
        profile
            .sram_read_exts
            .iter()
            .map(|ext| self.sram_file(profile, content, ext))
            .collect()
    }

    // Appended rather than `with_extension`, which would eat a dotted stem
    fn sram_file(&self, profile: &ConsoleProfile, content: &Path, ext: &str) -> PathBuf {
        self.documents
            .join("saves")
            .join(profile.save_dir)
            .join(format!("{}.{}", content_name(content), ext))
    }
}

/// Content base name without its extension, e.g. `Game (USA)` for `Game (USA).cue`
pub fn content_name(content: &Path) -> String {
    content
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "content".to_string())
}

fn ensure_dir(dir: PathBuf) -> io::Result<PathBuf> {
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
