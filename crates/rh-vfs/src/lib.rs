//! On-disk layout for retro-host
//!
//! Everything lives under one documents root:
//! `system/`, `saves/<console>/<content>.<ext>` and `states/<content>/<slot>.state`.

pub mod paths;
pub mod savedata;

pub use paths::HostPaths;
pub use savedata::{read_first_existing, write_atomic, SaveStateStore};
