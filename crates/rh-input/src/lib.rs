//! Input handling for retro-host
//!
//! The on-screen and physical input layers push button masks here; the
//! core reads them back through the input-state callback.

pub mod pad;

pub use pad::{InputSource, InputState, RetroPadButtons};
