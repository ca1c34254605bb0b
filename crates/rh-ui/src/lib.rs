//! Viewer for retro-host
//!
//! A single eframe window that owns a [`RetroHost`](rh_integration::RetroHost),
//! drives it from the repaint loop, shows its frames and feeds it keyboard
//! and on-screen pad input.

pub mod app;
pub mod keymap;
pub mod texture;
pub mod themes;

pub use app::RetroHostApp;
