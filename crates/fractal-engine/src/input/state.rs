use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Current input state for the window.
///
/// Tracks which keys are held so fixed-step updates can poll them; discrete
/// events are delivered to the application separately.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies a platform-agnostic input event.
    ///
    /// Returns `true` when the event changed the held-key set (a real press or
    /// release, not a repeat).
    pub fn apply_event(&mut self, ev: &InputEvent) -> bool {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Releases never arrive for keys held while focus is elsewhere.
                    let had_keys = !self.keys_down.is_empty();
                    self.keys_down.clear();
                    return had_keys;
                }
                false
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => self.keys_down.insert(*key),
                KeyState::Released => self.keys_down.remove(key),
            },

            InputEvent::PointerMoved(_) | InputEvent::MouseWheel { .. } => false,
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key { key, state, code: 0, repeat }
    }

    #[test]
    fn press_and_release_track_held_keys() {
        let mut s = InputState::default();
        assert!(s.apply_event(&key(Key::D, KeyState::Pressed, false)));
        assert!(s.key_down(Key::D));
        assert!(s.apply_event(&key(Key::D, KeyState::Released, false)));
        assert!(!s.key_down(Key::D));
    }

    #[test]
    fn repeat_press_does_not_change_state() {
        let mut s = InputState::default();
        s.apply_event(&key(Key::W, KeyState::Pressed, false));
        assert!(!s.apply_event(&key(Key::W, KeyState::Pressed, true)));
        assert!(s.key_down(Key::W));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut s = InputState::default();
        assert!(!s.apply_event(&key(Key::S, KeyState::Released, false)));
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::Focused(true));
        s.apply_event(&key(Key::A, KeyState::Pressed, false));
        s.apply_event(&key(Key::Space, KeyState::Pressed, false));

        assert!(s.apply_event(&InputEvent::Focused(false)));
        assert!(!s.focused);
        assert!(s.keys_down.is_empty());
    }
}
