//! Level-triggered keyboard state
//!
//! Key events update held flags; the game samples them once per tick.

use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::sim::TickInput;

/// What a key does in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Left,
    Right,
    Quit,
}

impl KeyAction {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::ArrowLeft | KeyCode::KeyA => Some(Self::Left),
            KeyCode::ArrowRight | KeyCode::KeyD => Some(Self::Right),
            KeyCode::Escape => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Held state of the movement keys.
///
/// Arrow and letter keys are tracked separately so releasing one does not
/// cancel the other while it is still held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardState {
    arrow_left: bool,
    arrow_right: bool,
    key_a: bool,
    key_d: bool,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition. Returns the mapped action, if any.
    pub fn handle_key(&mut self, key: PhysicalKey, state: ElementState) -> Option<KeyAction> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        let pressed = state.is_pressed();
        match code {
            KeyCode::ArrowLeft => self.arrow_left = pressed,
            KeyCode::ArrowRight => self.arrow_right = pressed,
            KeyCode::KeyA => self.key_a = pressed,
            KeyCode::KeyD => self.key_d = pressed,
            _ => {}
        }
        KeyAction::from_key(code)
    }

    /// Drop every held key, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    pub fn tick_input(&self) -> TickInput {
        TickInput {
            left: self.arrow_left || self.key_a,
            right: self.arrow_right || self.key_d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(kb: &mut KeyboardState, code: KeyCode) -> Option<KeyAction> {
        kb.handle_key(PhysicalKey::Code(code), ElementState::Pressed)
    }

    fn release(kb: &mut KeyboardState, code: KeyCode) -> Option<KeyAction> {
        kb.handle_key(PhysicalKey::Code(code), ElementState::Released)
    }

    #[test]
    fn test_arrows_and_letters() {
        let mut kb = KeyboardState::new();
        assert_eq!(kb.tick_input(), TickInput::default());

        assert_eq!(press(&mut kb, KeyCode::ArrowLeft), Some(KeyAction::Left));
        assert!(kb.tick_input().left);
        release(&mut kb, KeyCode::ArrowLeft);
        assert!(!kb.tick_input().left);

        assert_eq!(press(&mut kb, KeyCode::KeyD), Some(KeyAction::Right));
        assert!(kb.tick_input().right);
    }

    #[test]
    fn test_held_key_survives_other_release() {
        let mut kb = KeyboardState::new();
        press(&mut kb, KeyCode::ArrowRight);
        press(&mut kb, KeyCode::KeyD);
        release(&mut kb, KeyCode::KeyD);
        assert!(kb.tick_input().right);
    }

    #[test]
    fn test_both_directions_held() {
        let mut kb = KeyboardState::new();
        press(&mut kb, KeyCode::KeyA);
        press(&mut kb, KeyCode::ArrowRight);
        let input = kb.tick_input();
        assert!(input.left && input.right);
        assert_eq!(input.direction(), 0);
    }

    #[test]
    fn test_escape_and_unmapped_keys() {
        let mut kb = KeyboardState::new();
        assert_eq!(press(&mut kb, KeyCode::Escape), Some(KeyAction::Quit));
        assert_eq!(press(&mut kb, KeyCode::Space), None);
        assert_eq!(kb, KeyboardState::default());
    }

    #[test]
    fn test_release_all() {
        let mut kb = KeyboardState::new();
        press(&mut kb, KeyCode::ArrowLeft);
        press(&mut kb, KeyCode::KeyD);
        kb.release_all();
        assert_eq!(kb.tick_input(), TickInput::default());
    }
}
