//! Components attachable to entities.
//!
//! Components are plain data. The set of kinds is closed: every type that can
//! be stored in the [`World`](crate::world::World) implements
//! [`EngineComponent`] and names itself with a [`ComponentKind`].
//!
//! Submodules overview:
//! - [`animation`] – clip map and playback state for sprite animations
//! - [`boxcollider`] – axis-aligned collider with trigger flag and layer/mask bits
//! - [`button`] – clickable UI region bound to keys, gamepad buttons and touch
//! - [`inputcontrolled`] – key/gamepad bindings that turn input into movement intents
//! - [`life`] – hit points
//! - [`rigidbody`] – velocity, mass and acceleration
//! - [`sprite`] – visible texture region, flips and depth
//! - [`tilecollision`] – precomputed static obstacle rectangles
//! - [`transform`] – position, rotation and scale

pub mod animation;
pub mod boxcollider;
pub mod button;
pub mod inputcontrolled;
pub mod life;
pub mod rigidbody;
pub mod sprite;
pub mod tilecollision;
pub mod transform;

use bevy_ecs::component::{Component, Mutable};
use serde::{Deserialize, Serialize};

/// Every component kind the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Transform,
    Rigidbody,
    Collider,
    TileCollision,
    Sprite,
    Animation,
    InputController,
    Button,
    Life,
}

impl ComponentKind {
    /// Name used by entity templates.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "transform",
            ComponentKind::Rigidbody => "rigidbody",
            ComponentKind::Collider => "collider",
            ComponentKind::TileCollision => "tile_collision",
            ComponentKind::Sprite => "sprite",
            ComponentKind::Animation => "animation",
            ComponentKind::InputController => "input_controller",
            ComponentKind::Button => "button",
            ComponentKind::Life => "life",
        }
    }
}

/// A component type storable in the [`World`](crate::world::World).
pub trait EngineComponent: Component<Mutability = Mutable> {
    const KIND: ComponentKind;
}
