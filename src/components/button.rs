//! Clickable UI region.
//!
//! A [`Button`] is pressed by any of its bound keys, by any of its gamepad
//! buttons on a connected pad, or by a touch landing inside its area. The area
//! is centred on the entity's [`Transform`](super::transform::Transform)
//! position plus `offset`.

use bevy_ecs::prelude::Component;
use glam::Vec2;
use smallvec::SmallVec;

use super::{ComponentKind, EngineComponent};
use crate::aabb::Aabb2;
use crate::resources::input::{GamepadButton, Key};

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Button {
    /// Reported in click events.
    pub name: String,
    pub keys: SmallVec<[Key; 2]>,
    pub gamepad_buttons: SmallVec<[GamepadButton; 2]>,
    /// Touch area size; `None` disables touch.
    pub touch_size: Option<Vec2>,
    pub offset: Vec2,
    pub enabled: bool,
}

impl Button {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: SmallVec::new(),
            gamepad_buttons: SmallVec::new(),
            touch_size: None,
            offset: Vec2::ZERO,
            enabled: true,
        }
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }

    pub fn with_gamepad_button(mut self, button: GamepadButton) -> Self {
        self.gamepad_buttons.push(button);
        self
    }

    pub fn with_touch_area(mut self, size: Vec2, offset: Vec2) -> Self {
        self.touch_size = Some(size);
        self.offset = offset;
        self
    }

    /// World-space touch area for an entity at `position`.
    pub fn touch_area(&self, position: Vec2) -> Option<Aabb2> {
        self.touch_size
            .map(|size| Aabb2::from_center_size(position + self.offset, size))
    }
}

impl EngineComponent for Button {
    const KIND: ComponentKind = ComponentKind::Button;
}
