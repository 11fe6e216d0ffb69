//! Held input state
//!
//! The platform layer feeds raw key/button events in; the simulation only
//! reads. Keys are stored by logical name (upper-cased), mouse buttons by
//! their DOM-style index.

use std::collections::BTreeSet;

use glam::Vec2;

/// Primary mouse button
pub const BUTTON_PRIMARY: u8 = 0;
/// Secondary mouse button
pub const BUTTON_SECONDARY: u8 = 2;

/// Snapshot of everything the player is holding down
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    held_keys: BTreeSet<String>,
    held_buttons: BTreeSet<u8>,
    /// Pointer position in screen pixels
    pub pointer: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: &str) {
        self.held_keys.insert(key.to_uppercase());
    }

    pub fn key_up(&mut self, key: &str) {
        self.held_keys.remove(&key.to_uppercase());
    }

    pub fn button_down(&mut self, button: u8) {
        self.held_buttons.insert(button);
    }

    pub fn button_up(&mut self, button: u8) {
        self.held_buttons.remove(&button);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = Vec2::new(x, y);
    }

    pub fn is_key_held(&self, key: &str) -> bool {
        self.held_keys.contains(&key.to_uppercase())
    }

    pub fn is_button_held(&self, button: u8) -> bool {
        self.held_buttons.contains(&button)
    }

    /// WASD direction, each component in -1..=1 (screen coordinates, y down)
    pub fn move_axis(&self) -> Vec2 {
        let held = |k: &str| if self.is_key_held(k) { 1.0 } else { 0.0 };
        Vec2::new(held("D") - held("A"), held("S") - held("W"))
    }

    /// Drop every held key and button (focus loss, round reset)
    pub fn reset(&mut self) {
        self.held_keys.clear();
        self.held_buttons.clear();
    }
}
