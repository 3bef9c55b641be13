//! Engine systems.
//!
//! A system is a unit of per-frame logic. It may subscribe reactions on the
//! [`EventBus`] once at setup, and is then updated once per frame in its
//! scheduled slot. Systems keep no state between frames beyond what they
//! store in components.
//!
//! Submodules overview
//! - [`animation`] – advance clips, switch clips on direction and gameplay events
//! - [`button`] – key/gamepad/touch edges and clickable buttons
//! - [`input`] – turn device state into movement and action intents
//! - [`physics`] – integrate bodies, detect and resolve collisions
//! - [`render`] – read-only draw views sorted by depth

pub mod animation;
pub mod button;
pub mod input;
pub mod physics;
pub mod render;

use crate::error::EngineResult;
use crate::events::bus::EventBus;
use crate::resources::gameconfig::EngineConfig;
use crate::resources::input::InputTracker;
use crate::world::World;

/// Everything a system may touch during one frame.
pub struct Frame<'a> {
    pub world: &'a mut World,
    pub bus: &'a mut EventBus,
    /// Current and previous device state.
    pub input: &'a InputTracker,
    pub config: &'a EngineConfig,
    /// Scaled seconds since the previous frame.
    pub delta: f32,
}

/// A unit of per-frame logic.
pub trait System {
    /// Unique name within a scene.
    fn name(&self) -> &str;

    /// Register event reactions. Called once when the system is added to a scene.
    fn subscribe(&mut self, _bus: &mut EventBus, _config: &EngineConfig) {}

    fn update(&mut self, frame: &mut Frame<'_>) -> EngineResult<()>;
}
