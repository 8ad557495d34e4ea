//! Polled input state
//!
//! Events are the primary input channel; [`InputState`] folds them into a
//! snapshot that layers can query during update ("is W held?").

use std::collections::HashSet;

use glam::Vec2;
use winit::keyboard::KeyCode;

use crate::event::{Event, Modifiers, MouseButton};

/// Input state snapshot for the current frame
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Currently held keys
    pub keys: HashSet<KeyCode>,
    /// Currently held mouse buttons
    pub mouse_buttons: HashSet<MouseButton>,
    /// Cursor position in window coordinates, `None` before the first move
    pub mouse_pos: Option<Vec2>,
    /// Cursor movement accumulated this frame
    pub mouse_delta: Vec2,
    /// Wheel movement accumulated this frame
    pub scroll_delta: Vec2,
    /// Modifiers held at the last keyboard or mouse event
    pub modifiers: Modifiers,
    /// Whether the window currently has keyboard focus
    pub focused: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            focused: true,
            ..Self::default()
        }
    }

    /// Fold one event into the snapshot
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::KeyPressed { key, modifiers, .. } => {
                self.keys.insert(*key);
                self.modifiers = *modifiers;
            }
            Event::KeyReleased { key, modifiers } => {
                self.keys.remove(key);
                self.modifiers = *modifiers;
            }
            Event::MouseMoved { position, delta } => {
                self.mouse_pos = Some(*position);
                self.mouse_delta += *delta;
            }
            Event::MouseButtonPressed {
                button, modifiers, ..
            } => {
                self.mouse_buttons.insert(*button);
                self.modifiers = *modifiers;
            }
            Event::MouseButtonReleased {
                button, modifiers, ..
            } => {
                self.mouse_buttons.remove(button);
                self.modifiers = *modifiers;
            }
            Event::MouseScrolled { delta, .. } => self.scroll_delta += *delta,
            Event::WindowFocus => self.focused = true,
            // Release events are not delivered while unfocused
            Event::WindowLostFocus => {
                self.focused = false;
                self.keys.clear();
                self.mouse_buttons.clear();
            }
            _ => {}
        }
    }

    #[inline]
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Check if any of the given keys are pressed
    pub fn any_key_pressed(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|k| self.keys.contains(k))
    }

    /// Check if all of the given keys are pressed
    pub fn all_keys_pressed(&self, keys: &[KeyCode]) -> bool {
        keys.iter().all(|k| self.keys.contains(k))
    }

    #[inline]
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    pub fn any_mouse_pressed(&self) -> bool {
        !self.mouse_buttons.is_empty()
    }

    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mouse_pos
    }

    /// Clear all input state
    pub fn clear(&mut self) {
        *self = Self {
            focused: self.focused,
            ..Self::default()
        };
    }

    /// Clear per-frame deltas (call at end of frame)
    pub fn clear_deltas(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }
}
