//! Input-controlled movement component.
//!
//! [`InputController`] says which keys and gamepad buttons steer an entity
//! and how fast it moves. The
//! [`InputSystem`](crate::systems::input::InputSystem) reads it each frame and
//! publishes a movement intent; physics turns that intent into velocity using
//! `speed`.

use bevy_ecs::prelude::Component;
use glam::Vec2;
use smallvec::{SmallVec, smallvec};

use super::{ComponentKind, EngineComponent};
use crate::resources::input::{GamepadButton, InputTracker, Key};

/// Keys bound to each direction and action. Any bound key counts.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyBindings {
    pub up: SmallVec<[Key; 2]>,
    pub down: SmallVec<[Key; 2]>,
    pub left: SmallVec<[Key; 2]>,
    pub right: SmallVec<[Key; 2]>,
    pub action: SmallVec<[Key; 2]>,
    pub jump: SmallVec<[Key; 2]>,
}

impl Default for KeyBindings {
    /// WASD and arrow keys, Space for action, Enter for jump.
    fn default() -> Self {
        Self {
            up: smallvec![Key::W, Key::Up],
            down: smallvec![Key::S, Key::Down],
            left: smallvec![Key::A, Key::Left],
            right: smallvec![Key::D, Key::Right],
            action: smallvec![Key::Space],
            jump: smallvec![Key::Enter],
        }
    }
}

/// Gamepad buttons bound to each direction and action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GamepadBindings {
    pub up: GamepadButton,
    pub down: GamepadButton,
    pub left: GamepadButton,
    pub right: GamepadButton,
    pub action: GamepadButton,
    pub jump: GamepadButton,
    /// Also steer with the left stick.
    pub use_left_stick: bool,
}

impl Default for GamepadBindings {
    fn default() -> Self {
        Self {
            up: GamepadButton::DPadUp,
            down: GamepadButton::DPadDown,
            left: GamepadButton::DPadLeft,
            right: GamepadButton::DPadRight,
            action: GamepadButton::South,
            jump: GamepadButton::East,
            use_left_stick: true,
        }
    }
}

/// Marks an entity as steered by player input.
///
/// # Fields
/// - `keys` - keyboard bindings
/// - `gamepad` - gamepad bindings, used when `player` names a connected pad
/// - `player` - gamepad slot (0 to 3), `None` for keyboard only
/// - `speed` - world units per second when moving
/// - `last_direction` - direction published last frame, for stop detection
#[derive(Component, Clone, Debug, PartialEq)]
pub struct InputController {
    pub keys: KeyBindings,
    pub gamepad: GamepadBindings,
    pub player: Option<usize>,
    pub speed: f32,
    pub last_direction: Vec2,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl InputController {
    pub fn new(speed: f32) -> Self {
        Self {
            keys: KeyBindings::default(),
            gamepad: GamepadBindings::default(),
            player: None,
            speed,
            last_direction: Vec2::ZERO,
        }
    }

    pub fn with_player(mut self, player: usize) -> Self {
        self.player = Some(player);
        self
    }

    pub fn with_keys(mut self, keys: KeyBindings) -> Self {
        self.keys = keys;
        self
    }

    /// Raw (unnormalized) direction from the bindings this frame.
    ///
    /// Screen convention: +x right, +y down.
    pub fn read_direction(&self, input: &InputTracker, dead_zone: f32) -> Vec2 {
        let any = |keys: &[Key]| keys.iter().any(|k| input.is_key_down(*k));
        let mut dir = Vec2::ZERO;
        if any(self.keys.up.as_slice()) {
            dir.y -= 1.0;
        }
        if any(self.keys.down.as_slice()) {
            dir.y += 1.0;
        }
        if any(self.keys.left.as_slice()) {
            dir.x -= 1.0;
        }
        if any(self.keys.right.as_slice()) {
            dir.x += 1.0;
        }

        if let Some(player) = self.player.filter(|p| input.is_gamepad_connected(*p)) {
            let pad = &self.gamepad;
            let held = |b: GamepadButton| input.is_button_down(player, b);
            if held(pad.up) {
                dir.y -= 1.0;
            }
            if held(pad.down) {
                dir.y += 1.0;
            }
            if held(pad.left) {
                dir.x -= 1.0;
            }
            if held(pad.right) {
                dir.x += 1.0;
            }
            if pad.use_left_stick {
                dir += input.left_stick(player, dead_zone);
            }
        }
        dir
    }

    /// Whether the action binding went down this frame.
    pub fn action_just_pressed(&self, input: &InputTracker) -> bool {
        self.binding_just_pressed(input, &self.keys.action, self.gamepad.action)
    }

    /// Whether the jump binding went down this frame.
    pub fn jump_just_pressed(&self, input: &InputTracker) -> bool {
        self.binding_just_pressed(input, &self.keys.jump, self.gamepad.jump)
    }

    fn binding_just_pressed(&self, input: &InputTracker, keys: &[Key], button: GamepadButton) -> bool {
        keys.iter().any(|k| input.key_just_pressed(*k))
            || self
                .player
                .is_some_and(|p| input.button_just_pressed(p, button))
    }
}

impl EngineComponent for InputController {
    const KIND: ComponentKind = ComponentKind::InputController;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::input::InputSnapshot;

    fn tracker(snapshot: InputSnapshot) -> InputTracker {
        let mut t = InputTracker::new();
        t.advance(snapshot);
        t
    }

    #[test]
    fn opposite_keys_cancel() {
        let c = InputController::default();
        let t = tracker(InputSnapshot::new().with_key(Key::A).with_key(Key::Right));
        assert_eq!(c.read_direction(&t, 0.1), Vec2::ZERO);
    }

    #[test]
    fn diagonal_from_two_keys() {
        let c = InputController::default();
        let t = tracker(InputSnapshot::new().with_key(Key::W).with_key(Key::D));
        assert_eq!(c.read_direction(&t, 0.1), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn gamepad_only_when_player_set_and_connected() {
        let mut snap = InputSnapshot::new();
        snap.connect_gamepad(0);
        snap.set_gamepad_button(0, GamepadButton::DPadDown, true);
        let t = tracker(snap);

        assert_eq!(InputController::default().read_direction(&t, 0.1), Vec2::ZERO);
        let pad = InputController::default().with_player(0);
        assert_eq!(pad.read_direction(&t, 0.1), Vec2::new(0.0, 1.0));
        let other = InputController::default().with_player(1);
        assert_eq!(other.read_direction(&t, 0.1), Vec2::ZERO);
    }

    #[test]
    fn action_edge() {
        let c = InputController::default();
        let mut t = tracker(InputSnapshot::new().with_key(Key::Space));
        assert!(c.action_just_pressed(&t));
        assert!(!c.jump_just_pressed(&t));
        t.advance(InputSnapshot::new().with_key(Key::Space));
        assert!(!c.action_just_pressed(&t));
    }
}
