//! RetroPad joypad state

use bitflags::bitflags;
use rh_ffi::{DEVICE_JOYPAD, DEVICE_NONE};
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};

bitflags! {
    /// RetroPad buttons, bit `n` is button id `n`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RetroPadButtons: u16 {
        const B      = 1 << 0;
        const Y      = 1 << 1;
        const SELECT = 1 << 2;
        const START  = 1 << 3;
        const UP     = 1 << 4;
        const DOWN   = 1 << 5;
        const LEFT   = 1 << 6;
        const RIGHT  = 1 << 7;
        const A      = 1 << 8;
        const X      = 1 << 9;
        const L      = 1 << 10;
        const R      = 1 << 11;
        const L2     = 1 << 12;
        const R2     = 1 << 13;
        const L3     = 1 << 14;
        const R3     = 1 << 15;
    }
}

/// Number of RetroPad button ids
pub const BUTTON_COUNT: u32 = 16;

/// Source of a button mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// On-screen controls
    Touch,
    /// Keyboard or gamepad
    Physical,
}

/// Button state shared between the input layer and the core callbacks.
///
/// Touch and physical masks are stored separately and OR'd on read, so
/// releasing a key never clears a button still held on screen.
#[derive(Debug, Default)]
pub struct InputState {
    touch: AtomicU16,
    physical: AtomicU16,
    polls: AtomicU64,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mask for one source
    pub fn set_mask(&self, source: InputSource, buttons: RetroPadButtons) {
        self.slot(source).store(buttons.bits(), Ordering::Release);
    }

    /// Press or release a single button for one source
    pub fn set_button(&self, source: InputSource, button: RetroPadButtons, pressed: bool) {
        let slot = self.slot(source);
        if pressed {
            slot.fetch_or(button.bits(), Ordering::AcqRel);
        } else {
            slot.fetch_and(!button.bits(), Ordering::AcqRel);
        }
    }

    /// Effective mask seen by the core
    pub fn buttons(&self) -> RetroPadButtons {
        let bits = self.touch.load(Ordering::Acquire) | self.physical.load(Ordering::Acquire);
        RetroPadButtons::from_bits_truncate(bits)
    }

    /// Release everything on both sources
    pub fn clear(&self) {
        self.touch.store(0, Ordering::Release);
        self.physical.store(0, Ordering::Release);
    }

    /// Answer an input-state query.
    ///
    /// Only port 0 with the joypad (or unspecified) device is wired; every
    /// other query reads as released.
    pub fn state(&self, port: u32, device: u32, _index: u32, id: u32) -> i16 {
        if port != 0 || (device != DEVICE_JOYPAD && device != DEVICE_NONE) || id >= BUTTON_COUNT {
            return 0;
        }
        i16::from(self.buttons().bits() & (1 << id) != 0)
    }

    /// Called once per core poll. Masks are pushed asynchronously, so this only counts.
    pub fn poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    fn slot(&self, source: InputSource) -> &AtomicU16 {
        match source {
            InputSource::Touch => &self.touch,
            InputSource::Physical => &self.physical,
        }
    }
}
