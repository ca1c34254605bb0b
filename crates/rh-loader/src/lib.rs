//! Dynamic core loader for retro-host
//!
//! Finds a core binary on disk, opens it, binds the libretro entry points
//! and drives the init/deinit lifecycle.

pub mod discovery;
pub mod library;

pub use discovery::{candidate_paths, resolve, resolve_with};
pub use library::{CoreApi, CoreLibrary, DynamicCoreLoader, MemoryRegion};
