//! libretro ABI data types
//!
//! Layouts follow `libretro.h`. Field order matters: the core writes into
//! these structs through raw pointers.

use libc::{c_char, c_uint, c_void, size_t};

/// API version this host implements
pub const RETRO_API_VERSION: c_uint = 1;

/// Device ids passed to the input state callback
pub const DEVICE_NONE: c_uint = 0;
pub const DEVICE_JOYPAD: c_uint = 1;
pub const DEVICE_ANALOG: c_uint = 5;

/// Memory id for battery-backed save RAM
pub const MEMORY_SAVE_RAM: c_uint = 0;

/// Environment command ids
pub mod env {
    use libc::c_uint;

    pub const GET_CAN_DUPE: c_uint = 3;
    pub const GET_SYSTEM_DIRECTORY: c_uint = 9;
    pub const SET_PIXEL_FORMAT: c_uint = 10;
    pub const GET_VARIABLE: c_uint = 16;
    pub const GET_SAVE_DIRECTORY: c_uint = 31;
}

/// Framebuffer pixel layout negotiated through `SET_PIXEL_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelFormat {
    /// 0RGB1555, deprecated and the libretro default
    Rgb1555 = 0,
    /// XRGB8888, 32 bits per pixel
    Xrgb8888 = 1,
    /// RGB565, 16 bits per pixel
    Rgb565 = 2,
}

impl PixelFormat {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Rgb1555),
            1 => Some(Self::Xrgb8888),
            2 => Some(Self::Rgb565),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb1555 | Self::Rgb565 => 2,
            Self::Xrgb8888 => 4,
        }
    }
}

/// `struct retro_game_info`
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct GameInfo {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: size_t,
    pub meta: *const c_char,
}

impl GameInfo {
    /// Path-only game info. Data stays null so the core reads the file itself.
    pub fn from_path(path: *const c_char) -> Self {
        Self {
            path,
            data: std::ptr::null(),
            size: 0,
            meta: std::ptr::null(),
        }
    }
}

/// `struct retro_game_geometry`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct GameGeometry {
    pub base_width: c_uint,
    pub base_height: c_uint,
    pub max_width: c_uint,
    pub max_height: c_uint,
    pub aspect_ratio: f32,
}

/// `struct retro_system_timing`
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct SystemTiming {
    pub fps: f64,
    pub sample_rate: f64,
}

impl Default for SystemTiming {
    fn default() -> Self {
        Self {
            fps: 60.0,
            sample_rate: 44100.0,
        }
    }
}

/// `struct retro_system_av_info`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct SystemAvInfo {
    pub geometry: GameGeometry,
    pub timing: SystemTiming,
}

/// `struct retro_variable`
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Variable {
    pub key: *const c_char,
    pub value: *const c_char,
}
