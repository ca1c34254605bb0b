//! Save states and battery-backed save RAM
//!
//! Two independent paths. Save states are opaque blobs produced by the
//! core's serializer. SRAM is a core-owned memory region mirrored to a file
//! next to the other saves for the same console.

use rh_core::error::{HostError, StateError};
use rh_core::ConsoleProfile;
use rh_ffi::MEMORY_SAVE_RAM;
use rh_loader::CoreLibrary;
use rh_vfs::{read_first_existing, write_atomic, HostPaths};
use std::path::{Path, PathBuf};

/// Persistence for one loaded piece of content
#[derive(Debug, Clone)]
pub struct StateIo {
    sram_read: Vec<PathBuf>,
    sram_write: PathBuf,
}

impl StateIo {
    pub fn new(profile: &ConsoleProfile, paths: &HostPaths, content: &Path) -> Self {
        Self {
            sram_read: paths.sram_read_paths(profile, content),
            sram_write: paths.sram_write_path(profile, content),
        }
    }

    /// File SRAM is written to
    pub fn sram_path(&self) -> &Path {
        &self.sram_write
    }

    /// Serialize the whole machine.
    ///
    /// The buffer is sized from `retro_serialize_size`; a size that changes
    /// across the call or a core-side failure yields no blob at all.
    pub fn save_state(core: &CoreLibrary) -> Result<Vec<u8>, StateError> {
        let size = core.serialize_size().ok_or(StateError::Unsupported)?;
        if size == 0 {
            return Err(StateError::Unsupported);
        }

        let mut blob = vec![0u8; size];
        match core.serialize(&mut blob) {
            None => return Err(StateError::Unsupported),
            Some(false) => return Err(StateError::CoreRejected),
            Some(true) => {}
        }

        let after = core.serialize_size().unwrap_or(0);
        if after != size {
            return Err(StateError::SizeMismatch {
                expected: size,
                actual: after,
            });
        }
        Ok(blob)
    }

    /// Hand a blob back to the core verbatim
    pub fn load_state(core: &CoreLibrary, blob: &[u8]) -> Result<(), StateError> {
        match core.unserialize(blob) {
            None => Err(StateError::Unsupported),
            Some(false) => Err(StateError::CoreRejected),
            Some(true) => Ok(()),
        }
    }

    /// Copy the SRAM file into the core's region.
    ///
    /// No region or no file is not an error and returns `Ok(None)`. A file
    /// larger than the region is refused.
    pub fn load_persistent(&self, core: &CoreLibrary) -> Result<Option<usize>, HostError> {
        let Some(mut region) = core.memory_region(MEMORY_SAVE_RAM) else {
            tracing::debug!("Core exposes no save RAM");
            return Ok(None);
        };
        let Some((path, data)) = read_first_existing(&self.sram_read)? else {
            return Ok(None);
        };

        region.fill_from(&data)?;
        tracing::info!("Loaded {} bytes of save RAM from {}", data.len(), path.display());
        Ok(Some(data.len()))
    }

    /// Write the core's SRAM region out, replacing the previous file
    pub fn save_persistent(&self, core: &CoreLibrary) -> Result<Option<usize>, HostError> {
        let Some(region) = core.memory_region(MEMORY_SAVE_RAM) else {
            return Ok(None);
        };
        let data = region.to_vec();
        write_atomic(&self.sram_write, &data)?;
        tracing::info!(
            "Saved {} bytes of save RAM to {}",
            data.len(),
            self.sram_write.display()
        );
        Ok(Some(data.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rh_core::profile::{GBA, PSX};

    #[test]
    fn test_paths_follow_profile() {
        let paths = HostPaths::new("/docs");
        let io = StateIo::new(&GBA, &paths, Path::new("/roms/Golden Sun.gba"));
        assert_eq!(io.sram_path(), Path::new("/docs/saves/gba/Golden Sun.sav"));
        assert_eq!(io.sram_read.len(), 2);

        let io = StateIo::new(&PSX, &paths, Path::new("/games/FF7 (Disc 1).cue"));
        assert_eq!(io.sram_path(), Path::new("/docs/saves/psx/FF7 (Disc 1).srm"));
    }
}
