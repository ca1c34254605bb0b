//! Keyboard bindings

use eframe::egui::Key;
use rh_input::RetroPadButtons;

/// Default keyboard layout for the RetroPad
pub const PAD_KEYS: &[(Key, RetroPadButtons)] = &[
    (Key::ArrowUp, RetroPadButtons::UP),
    (Key::ArrowDown, RetroPadButtons::DOWN),
    (Key::ArrowLeft, RetroPadButtons::LEFT),
    (Key::ArrowRight, RetroPadButtons::RIGHT),
    (Key::X, RetroPadButtons::A),
    (Key::Z, RetroPadButtons::B),
    (Key::S, RetroPadButtons::X),
    (Key::A, RetroPadButtons::Y),
    (Key::Q, RetroPadButtons::L),
    (Key::W, RetroPadButtons::R),
    (Key::E, RetroPadButtons::L2),
    (Key::R, RetroPadButtons::R2),
    (Key::Enter, RetroPadButtons::START),
    (Key::Backspace, RetroPadButtons::SELECT),
];

/// Host shortcuts
pub const KEY_PAUSE: Key = Key::Space;
/// Held, not toggled
pub const KEY_FAST_FORWARD: Key = Key::Tab;
pub const KEY_RESET: Key = Key::F1;
pub const KEY_SAVE_SLOT: Key = Key::F2;
pub const KEY_NEXT_SLOT: Key = Key::F3;
pub const KEY_LOAD_SLOT: Key = Key::F4;

/// Number of quick-save slots cycled by [`KEY_NEXT_SLOT`]
pub const SLOT_COUNT: u32 = 10;

/// Button mask for the keys `is_down` reports as held
pub fn pad_from_keys(mut is_down: impl FnMut(Key) -> bool) -> RetroPadButtons {
    PAD_KEYS
        .iter()
        .filter(|(key, _)| is_down(*key))
        .fold(RetroPadButtons::empty(), |mask, (_, button)| mask | *button)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_keys_no_buttons() {
        assert!(pad_from_keys(|_| false).is_empty());
    }

    #[test]
    fn test_chord() {
        let held = [Key::ArrowLeft, Key::X, Key::Enter, Key::F9];
        let mask = pad_from_keys(|k| held.contains(&k));
        assert_eq!(
            mask,
            RetroPadButtons::LEFT | RetroPadButtons::A | RetroPadButtons::START
        );
    }

    #[test]
    fn test_bindings_distinct() {
        for (i, (key, button)) in PAD_KEYS.iter().enumerate() {
            for (other_key, other_button) in &PAD_KEYS[i + 1..] {
                assert_ne!(key, other_key);
                assert_ne!(button, other_button);
            }
            assert_ne!(*key, KEY_PAUSE);
            assert_ne!(*key, KEY_FAST_FORWARD);
        }
    }
}
