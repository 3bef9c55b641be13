//! World-space placement of an entity.
//!
//! [`Transform`] replaces the separate position / rotation / scale components
//! with one record, since physics needs position and scale together when it
//! builds collider boxes.

use bevy_ecs::prelude::Component;
use glam::Vec2;

use super::{ComponentKind, EngineComponent};

/// Position (pivot), rotation in radians and non-uniform scale.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    /// Radians, counter-clockwise.
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    /// Moves the pivot by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

impl EngineComponent for Transform {
    const KIND: ComponentKind = ComponentKind::Transform;
}
