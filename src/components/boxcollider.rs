use bevy_ecs::prelude::Component;
use glam::Vec2;

use super::transform::Transform;
use super::{ComponentKind, EngineComponent};
use crate::aabb::Aabb2;

/// Named collision layer bits.
///
/// A collider's `layer` says what it is; its `mask` says which layers it
/// reacts to. Games are free to define further bits above these.
pub mod layers {
    pub const NONE: u32 = 0;
    pub const DEFAULT: u32 = 1 << 0;
    pub const PLAYER: u32 = 1 << 1;
    pub const ENEMY: u32 = 1 << 2;
    pub const WALL: u32 = 1 << 3;
    pub const ITEM: u32 = 1 << 4;
    pub const PROJECTILE: u32 = 1 << 5;
    pub const ALL: u32 = u32::MAX;
}

/// Axis-aligned box collider.
///
/// The box is `size` wide and tall, placed at `offset` from the entity's
/// position, both multiplied by the entity's scale.
#[derive(Debug, Clone, PartialEq, Component)]
pub struct Collider {
    pub size: Vec2,
    pub offset: Vec2,
    /// Triggers report overlaps but never block.
    pub is_trigger: bool,
    pub tag: String,
    pub layer: u32,
    pub mask: u32,
    /// A disabled collider takes part in nothing.
    pub enabled: bool,
}

impl Collider {
    /// Create a Collider with given size on the default layer, reacting to everything.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            offset: Vec2::ZERO,
            is_trigger: false,
            tag: String::new(),
            layer: layers::DEFAULT,
            mask: layers::ALL,
            enabled: true,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_layers(mut self, layer: u32, mask: u32) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// World-space box for an entity at `transform`.
    /// Negative scale mirrors the box; the result is always normalized.
    pub fn aabb(&self, transform: &Transform) -> Aabb2 {
        let origin = transform.position + self.offset * transform.scale;
        Aabb2::from_origin_size(origin, self.size * transform.scale)
    }

    /// Whether this collider may react to `other`.
    pub fn accepts(&self, other: &Self) -> bool {
        self.enabled && other.enabled && (self.mask & other.layer) != 0
    }
}

impl EngineComponent for Collider {
    const KIND: ComponentKind = ComponentKind::Collider;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_applies_offset_and_scale() {
        let c = Collider::new(10.0, 4.0).with_offset(Vec2::new(2.0, 1.0));
        let t = Transform::at(Vec2::new(100.0, 50.0)).with_scale(Vec2::new(2.0, 3.0));
        let b = c.aabb(&t);
        assert_eq!(b.min, Vec2::new(104.0, 53.0));
        assert_eq!(b.max, Vec2::new(124.0, 65.0));
    }

    #[test]
    fn negative_scale_is_normalized() {
        let c = Collider::new(10.0, 10.0);
        let t = Transform::at(Vec2::ZERO).with_scale(Vec2::new(-1.0, 1.0));
        let b = c.aabb(&t);
        assert_eq!(b.min, Vec2::new(-10.0, 0.0));
        assert_eq!(b.max, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn mask_must_match_layer() {
        let player = Collider::new(1.0, 1.0).with_layers(layers::PLAYER, layers::WALL);
        let wall = Collider::new(1.0, 1.0).with_layers(layers::WALL, layers::NONE);
        let item = Collider::new(1.0, 1.0).with_layers(layers::ITEM, layers::PLAYER);
        assert!(player.accepts(&wall));
        assert!(!wall.accepts(&player));
        assert!(!player.accepts(&item));
        assert!(item.accepts(&player));
    }

    #[test]
    fn disabled_collider_accepts_nothing() {
        let mut a = Collider::new(1.0, 1.0);
        let b = Collider::new(1.0, 1.0);
        a.enabled = false;
        assert!(!a.accepts(&b));
        assert!(!b.accepts(&a));
    }
}
