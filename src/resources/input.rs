//! Per-frame device input.
//!
//! The engine never polls devices. The host fills an [`InputSnapshot`] each
//! frame with the keys held, the state of up to four gamepads and the active
//! touch points, and hands it to the scene. An [`InputTracker`] keeps exactly
//! one previous snapshot so systems can ask for press and release edges.
//!
//! Key and button names deserialize from their variant names (`"Escape"`,
//! `"DPadUp"`), which is how configuration files and entity templates refer to
//! them.

use std::str::FromStr;

use arrayvec::ArrayVec;
use glam::Vec2;
use rustc_hash::FxHashSet;
use serde::de::IntoDeserializer;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::aabb::Aabb2;

/// Number of gamepad slots in a snapshot (players 0 to 3).
pub const MAX_GAMEPADS: usize = 4;
/// Touch points beyond this are dropped.
pub const MAX_TOUCHES: usize = 10;

/// Parse a unit enum variant from its serialized name.
pub fn parse_name<'a, T: Deserialize<'a>>(name: &'a str) -> Result<T, String> {
    let de: StrDeserializer<'a, ValueError> = name.into_deserializer();
    T::deserialize(de).map_err(|e| e.to_string())
}

/// Keyboard keys the engine can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_name(s)
    }
}

/// Gamepad buttons, named by position rather than by vendor label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadButton {
    South,
    East,
    West,
    North,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    LeftShoulder,
    RightShoulder,
    Start,
    Select,
}

impl FromStr for GamepadButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_name(s)
    }
}

/// State of one gamepad slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadState {
    pub connected: bool,
    pub buttons_down: SmallVec<[GamepadButton; 8]>,
    /// Raw stick position, each axis in [-1, 1], +y pointing down.
    pub left_stick: Vec2,
}

impl GamepadState {
    pub fn is_down(&self, button: GamepadButton) -> bool {
        self.connected && self.buttons_down.contains(&button)
    }
}

/// A pointer or finger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Vec2,
    pub pressed: bool,
}

/// Device state for a single frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub keys_down: FxHashSet<Key>,
    pub gamepads: [GamepadState; MAX_GAMEPADS],
    pub touches: ArrayVec<TouchPoint, MAX_TOUCHES>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`InputSnapshot::press_key`].
    pub fn with_key(mut self, key: Key) -> Self {
        self.press_key(key);
        self
    }

    pub fn press_key(&mut self, key: Key) {
        self.keys_down.insert(key);
    }

    pub fn release_key(&mut self, key: Key) {
        self.keys_down.remove(&key);
    }

    /// Marks the slot connected. Out-of-range players are ignored.
    pub fn connect_gamepad(&mut self, player: usize) {
        if let Some(pad) = self.gamepads.get_mut(player) {
            pad.connected = true;
        }
    }

    pub fn set_gamepad_button(&mut self, player: usize, button: GamepadButton, down: bool) {
        let Some(pad) = self.gamepads.get_mut(player) else {
            return;
        };
        let held = pad.buttons_down.contains(&button);
        if down && !held {
            pad.buttons_down.push(button);
        } else if !down && held {
            pad.buttons_down.retain(|b| *b != button);
        }
    }

    pub fn set_left_stick(&mut self, player: usize, value: Vec2) {
        if let Some(pad) = self.gamepads.get_mut(player) {
            pad.left_stick = value.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        }
    }

    /// Adds a touch point; silently dropped once [`MAX_TOUCHES`] are present.
    pub fn add_touch(&mut self, touch: TouchPoint) {
        let _ = self.touches.try_push(touch);
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn is_button_down(&self, player: usize, button: GamepadButton) -> bool {
        self.gamepads
            .get(player)
            .is_some_and(|pad| pad.is_down(button))
    }

    /// Whether any pressed touch lies inside `area`.
    pub fn is_pointer_down_in(&self, area: &Aabb2) -> bool {
        self.touches
            .iter()
            .any(|t| t.pressed && area.contains_point(t.position))
    }
}

/// Current and previous [`InputSnapshot`], for edge detection.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    previous: InputSnapshot,
    current: InputSnapshot,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `snapshot` current; the old current becomes previous.
    pub fn advance(&mut self, snapshot: InputSnapshot) {
        self.previous = std::mem::replace(&mut self.current, snapshot);
    }

    pub fn current(&self) -> &InputSnapshot {
        &self.current
    }

    pub fn previous(&self) -> &InputSnapshot {
        &self.previous
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.current.is_key_down(key)
    }

    pub fn key_just_pressed(&self, key: Key) -> bool {
        self.current.is_key_down(key) && !self.previous.is_key_down(key)
    }

    pub fn key_just_released(&self, key: Key) -> bool {
        !self.current.is_key_down(key) && self.previous.is_key_down(key)
    }

    pub fn is_button_down(&self, player: usize, button: GamepadButton) -> bool {
        self.current.is_button_down(player, button)
    }

    pub fn button_just_pressed(&self, player: usize, button: GamepadButton) -> bool {
        self.current.is_button_down(player, button) && !self.previous.is_button_down(player, button)
    }

    pub fn button_just_released(&self, player: usize, button: GamepadButton) -> bool {
        !self.current.is_button_down(player, button) && self.previous.is_button_down(player, button)
    }

    pub fn is_gamepad_connected(&self, player: usize) -> bool {
        self.current
            .gamepads
            .get(player)
            .is_some_and(|pad| pad.connected)
    }

    /// Left stick of `player` with axes inside `dead_zone` zeroed.
    pub fn left_stick(&self, player: usize, dead_zone: f32) -> Vec2 {
        let Some(pad) = self.current.gamepads.get(player).filter(|p| p.connected) else {
            return Vec2::ZERO;
        };
        let mut v = pad.left_stick;
        if v.x.abs() < dead_zone {
            v.x = 0.0;
        }
        if v.y.abs() < dead_zone {
            v.y = 0.0;
        }
        v
    }

    /// A pointer went down inside `area` this frame.
    pub fn pointer_just_pressed(&self, area: &Aabb2) -> bool {
        self.current.is_pointer_down_in(area) && !self.previous.is_pointer_down_in(area)
    }

    /// Touches pressed inside `area` this frame that were not pressed last frame.
    pub fn new_touches_in<'a>(&'a self, area: &'a Aabb2) -> impl Iterator<Item = &'a TouchPoint> + 'a {
        self.current.touches.iter().filter(move |t| {
            t.pressed
                && area.contains_point(t.position)
                && !self
                    .previous
                    .touches
                    .iter()
                    .any(|p| p.id == t.id && p.pressed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_parse() {
        assert_eq!("Escape".parse::<Key>(), Ok(Key::Escape));
        assert_eq!("W".parse::<Key>(), Ok(Key::W));
        assert!("Hyper".parse::<Key>().is_err());
        assert_eq!(
            "DPadLeft".parse::<GamepadButton>(),
            Ok(GamepadButton::DPadLeft)
        );
    }

    #[test]
    fn test_key_edges() {
        let mut tracker = InputTracker::new();
        tracker.advance(InputSnapshot::new().with_key(Key::Space));
        assert!(tracker.key_just_pressed(Key::Space));
        assert!(!tracker.key_just_released(Key::Space));

        tracker.advance(InputSnapshot::new().with_key(Key::Space));
        assert!(tracker.is_key_down(Key::Space));
        assert!(!tracker.key_just_pressed(Key::Space));

        tracker.advance(InputSnapshot::new());
        assert!(tracker.key_just_released(Key::Space));
        assert!(!tracker.is_key_down(Key::Space));
    }

    #[test]
    fn test_disconnected_gamepad_reads_nothing() {
        let mut snap = InputSnapshot::new();
        snap.set_gamepad_button(1, GamepadButton::South, true);
        snap.set_left_stick(1, Vec2::new(1.0, 0.0));
        let mut tracker = InputTracker::new();
        tracker.advance(snap.clone());
        assert!(!tracker.button_just_pressed(1, GamepadButton::South));
        assert_eq!(tracker.left_stick(1, 0.1), Vec2::ZERO);

        snap.connect_gamepad(1);
        tracker.advance(snap);
        assert!(tracker.button_just_pressed(1, GamepadButton::South));
        assert_eq!(tracker.left_stick(1, 0.1), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_stick_dead_zone() {
        let mut snap = InputSnapshot::new();
        snap.connect_gamepad(0);
        snap.set_left_stick(0, Vec2::new(0.05, -0.8));
        let mut tracker = InputTracker::new();
        tracker.advance(snap);
        assert_eq!(tracker.left_stick(0, 0.1), Vec2::new(0.0, -0.8));
    }

    #[test]
    fn test_out_of_range_player_is_ignored() {
        let mut snap = InputSnapshot::new();
        snap.connect_gamepad(7);
        snap.set_gamepad_button(7, GamepadButton::North, true);
        assert!(!snap.is_button_down(7, GamepadButton::North));
    }

    #[test]
    fn test_pointer_edge_inside_area() {
        let area = Aabb2::from_center_size(Vec2::new(10.0, 10.0), Vec2::splat(10.0));
        let touch = TouchPoint {
            id: 1,
            position: Vec2::new(12.0, 9.0),
            pressed: true,
        };
        let mut snap = InputSnapshot::new();
        snap.add_touch(touch);

        let mut tracker = InputTracker::new();
        tracker.advance(snap.clone());
        assert!(tracker.pointer_just_pressed(&area));
        assert_eq!(tracker.new_touches_in(&area).count(), 1);

        tracker.advance(snap);
        assert!(!tracker.pointer_just_pressed(&area));
        assert_eq!(tracker.new_touches_in(&area).count(), 0);
    }
}
