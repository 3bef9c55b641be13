//! Entity lifecycle events, queued by the scene's spawn and destroy helpers.

use glam::Vec2;

use super::bus::EventHeader;
use crate::world::EntityId;

#[derive(Debug, Clone)]
pub struct EntitySpawnedEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    /// Free-form kind name from the template ("player", "coin", ...).
    pub kind: String,
    pub position: Vec2,
}

/// Queued after the entity is gone; `entity` may already be recycled by the
/// time handlers see it.
#[derive(Debug, Clone)]
pub struct EntityDestroyedEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    pub kind: String,
    pub last_position: Vec2,
}

impl EntitySpawnedEvent {
    pub fn new(entity: EntityId, kind: impl Into<String>, position: Vec2) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            kind: kind.into(),
            position,
        }
    }
}

impl EntityDestroyedEvent {
    pub fn new(entity: EntityId, kind: impl Into<String>, last_position: Vec2) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            kind: kind.into(),
            last_position,
        }
    }
}

game_event!(EntitySpawnedEvent, EntityDestroyedEvent);
