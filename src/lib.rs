//! framestep engine core library.
//!
//! A frame-stepped 2D entity-component-system core: entity registry, event
//! bus, physics and collision, animation, input edge detection and a scene
//! driver that runs them in a fixed order each frame. Rendering, audio and
//! device polling stay with the host.

pub mod aabb;
pub mod components;
pub mod error;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
pub mod template;
pub mod world;
