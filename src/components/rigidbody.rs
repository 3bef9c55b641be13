//! Kinematic body component.
//!
//! The [`Rigidbody`] stores velocity, mass and a constant acceleration for an
//! entity. The physics system integrates acceleration into velocity and
//! velocity into the entity's [`Transform`](super::transform::Transform).
//!
//! A mass of zero marks the body as immovable: it still blocks other bodies
//! but collision resolution never pushes it and impulses do nothing.
//!
//! The `frozen` flag skips integration entirely, useful when gameplay code
//! positions the entity by hand for a while.

use bevy_ecs::prelude::Component;
use glam::Vec2;

use super::{ComponentKind, EngineComponent};

/// Kinematic body.
///
/// # Fields
/// - `velocity` - world units per second
/// - `mass` - `0.0` means static
/// - `acceleration` - world units per second squared, added to velocity each frame
/// - `max_speed` - optional clamp on the velocity magnitude
/// - `frozen` - when true the physics system leaves the body alone
///
/// # Example
/// ```ignore
/// let wall = Rigidbody::immovable();
/// let ball = Rigidbody::with_mass(2.0).with_velocity(Vec2::new(100.0, 0.0));
/// ```
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Rigidbody {
    pub velocity: Vec2,
    pub mass: f32,
    pub acceleration: Vec2,
    pub max_speed: Option<f32>,
    pub frozen: bool,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            mass: 1.0,
            acceleration: Vec2::ZERO,
            max_speed: None,
            frozen: false,
        }
    }
}

impl Rigidbody {
    pub fn with_mass(mass: f32) -> Self {
        Self {
            mass: mass.max(0.0),
            ..Self::default()
        }
    }

    /// A static obstacle.
    pub fn immovable() -> Self {
        Self::with_mass(0.0)
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = Some(max_speed);
        self
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    /// Clamp velocity to `max_speed` if set.
    pub fn clamp_speed(&mut self) {
        if let Some(max) = self.max_speed {
            self.velocity = self.velocity.clamp_length_max(max);
        }
    }
}

impl EngineComponent for Rigidbody {
    const KIND: ComponentKind = ComponentKind::Rigidbody;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_body_is_dynamic() {
        let rb = Rigidbody::default();
        assert_eq!(rb.mass, 1.0);
        assert!(!rb.is_static());
        assert!(Rigidbody::immovable().is_static());
    }

    #[test]
    fn negative_mass_is_treated_as_static() {
        assert!(Rigidbody::with_mass(-3.0).is_static());
    }

    #[test]
    fn clamp_speed_limits_magnitude() {
        let mut rb = Rigidbody::default()
            .with_velocity(Vec2::new(300.0, 400.0))
            .with_max_speed(50.0);
        rb.clamp_speed();
        assert!((rb.velocity.length() - 50.0).abs() < 1e-4);
    }
}
