use bevy_ecs::prelude::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{ComponentKind, EngineComponent};

/// A rectangle inside a texture atlas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextureRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextureRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Sprite is identified by a texture key and the region of that texture to show.
/// The animation system rewrites `region` as frames advance.
/// The origin selects the pivot point (in pixels) relative to the region's top-left
/// used for placement/rotation/scaling when rendering.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Sprite {
    pub tex_key: String,
    pub region: TextureRegion,
    pub origin: Vec2,
    pub flip_h: bool,
    pub flip_v: bool,
    /// Higher values are drawn later (on top).
    pub depth: i32,
    pub visible: bool,
}

impl Sprite {
    pub fn new(tex_key: impl Into<String>, region: TextureRegion) -> Self {
        Self {
            tex_key: tex_key.into(),
            region,
            origin: Vec2::ZERO,
            flip_h: false,
            flip_v: false,
            depth: 0,
            visible: true,
        }
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }
}

impl EngineComponent for Sprite {
    const KIND: ComponentKind = ComponentKind::Sprite;
}
