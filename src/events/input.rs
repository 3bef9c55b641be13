//! Input events.
//!
//! The input system turns device state into intents: a normalized movement
//! direction per controlled entity ([`EntityDirectionEvent`]) and action
//! presses ([`InputActionEvent`]). The button system additionally reports raw
//! press/release edges of bound keys, gamepad buttons and touches.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bus::EventHeader;
use crate::resources::input::{GamepadButton, Key};
use crate::world::EntityId;

/// Logical actions a controller can trigger besides moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAction {
    /// Primary action button (default: Space / South).
    Action,
    /// Jump button (default: Enter / East).
    Jump,
}

/// Movement intent for one entity. A zero `direction` means "stop".
#[derive(Debug, Clone)]
pub struct EntityDirectionEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    /// Unit vector, or zero.
    pub direction: Vec2,
}

/// An action binding was pressed or released.
#[derive(Debug, Clone)]
pub struct InputActionEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    pub action: InputAction,
    pub pressed: bool,
}

#[derive(Debug, Clone)]
pub struct KeyPressedEvent {
    pub header: EventHeader,
    pub key: Key,
}

#[derive(Debug, Clone)]
pub struct KeyReleasedEvent {
    pub header: EventHeader,
    pub key: Key,
}

#[derive(Debug, Clone)]
pub struct GamepadButtonEvent {
    pub header: EventHeader,
    pub player: usize,
    pub button: GamepadButton,
    pub pressed: bool,
}

#[derive(Debug, Clone)]
pub struct TouchEvent {
    pub header: EventHeader,
    pub id: u64,
    pub position: Vec2,
    pub pressed: bool,
}

impl EntityDirectionEvent {
    /// `direction` is normalized here; a zero vector stays zero.
    pub fn new(entity: EntityId, direction: Vec2) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn is_stop(&self) -> bool {
        self.direction == Vec2::ZERO
    }
}

impl InputActionEvent {
    pub fn new(entity: EntityId, action: InputAction, pressed: bool) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            action,
            pressed,
        }
    }
}

impl KeyPressedEvent {
    pub fn new(key: Key) -> Self {
        Self {
            header: EventHeader::now(),
            key,
        }
    }
}

impl KeyReleasedEvent {
    pub fn new(key: Key) -> Self {
        Self {
            header: EventHeader::now(),
            key,
        }
    }
}

impl GamepadButtonEvent {
    pub fn new(player: usize, button: GamepadButton, pressed: bool) -> Self {
        Self {
            header: EventHeader::now(),
            player,
            button,
            pressed,
        }
    }
}

impl TouchEvent {
    pub fn new(id: u64, position: Vec2, pressed: bool) -> Self {
        Self {
            header: EventHeader::now(),
            id,
            position,
            pressed,
        }
    }
}

game_event!(
    EntityDirectionEvent,
    InputActionEvent,
    KeyPressedEvent,
    KeyReleasedEvent,
    GamepadButtonEvent,
    TouchEvent
);
