//! Core binary discovery
//!
//! Candidates are checked in a fixed precedence: bundled frameworks, then
//! root-level frameworks, then loose libraries by name. The first file that
//! exists wins; nothing is merged and nothing past the winner is probed.

use rh_core::error::LoaderError;
use rh_core::ConsoleProfile;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Build the ordered candidate list for a profile over the given search roots
pub fn candidate_paths(profile: &ConsoleProfile, roots: &[PathBuf]) -> Vec<PathBuf> {
    let fw = profile.framework;
    let bundle = format!("{fw}.framework");
    let mut candidates = Vec::new();

    for root in roots {
        candidates.push(root.join("Frameworks").join(&bundle).join(fw));
    }
    for root in roots {
        candidates.push(root.join(&bundle).join(fw));
    }

    let mut extensions = vec![std::env::consts::DLL_EXTENSION];
    if !extensions.contains(&"dylib") {
        extensions.push("dylib");
    }

    for root in roots {
        for name in profile.library_names {
            for ext in &extensions {
                candidates.push(root.join(format!("{name}.{ext}")));
            }
        }
    }

    candidates
}

/// Pick the first candidate that is an existing file
pub fn resolve(candidates: &[PathBuf]) -> Result<PathBuf, LoaderError> {
    resolve_with(candidates, |p| p.is_file())
}

/// Pick the first candidate accepted by `exists`.
///
/// `exists` is never called for candidates after the winner.
pub fn resolve_with<F>(candidates: &[PathBuf], mut exists: F) -> Result<PathBuf, LoaderError>
where
    F: FnMut(&Path) -> bool,
{
    for candidate in candidates {
        debug!("Checking core candidate: {}", candidate.display());
        if exists(candidate) {
            info!("Found core at {}", candidate.display());
            return Ok(candidate.clone());
        }
    }

    error!("Could not find core binary ({} candidates)", candidates.len());
    Err(LoaderError::CoreNotFound {
        candidates: candidates.to_vec(),
    })
}
