//! Long-lived engine data.
//!
//! Some of these are stored as `bevy_ecs` resources inside the
//! [`World`](crate::world::World) (time, pause flag, configuration); the rest
//! are plain data handed to the scene by the host (input snapshots, tile maps).
//!
//! Overview
//! - `gameconfig` – INI-backed engine configuration
//! - `input` – device snapshots and one-frame edge tracking
//! - `pause` – global pause flag
//! - `tilemap` – tile map data used to build collision surfaces
//! - `worldtime` – simulation time and delta
pub mod gameconfig;
pub mod input;
pub mod pause;
pub mod tilemap;
pub mod worldtime;
