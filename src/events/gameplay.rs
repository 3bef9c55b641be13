//! Gameplay events the built-in systems react to.
//!
//! - physics stops an entity on [`EntityDiedEvent`] and disables an item's
//!   collider on [`ItemCollectedEvent`]
//! - animation plays `Hit` on damage, `Death` on death and `Loot` on pickup

use super::bus::EventHeader;
use crate::world::EntityId;

#[derive(Debug, Clone)]
pub struct HealthChangedEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    pub previous: i32,
    pub current: i32,
    pub max: i32,
}

#[derive(Debug, Clone)]
pub struct EntityDiedEvent {
    pub header: EventHeader,
    pub entity: EntityId,
}

#[derive(Debug, Clone)]
pub struct ItemCollectedEvent {
    pub header: EventHeader,
    pub item: EntityId,
    pub collector: EntityId,
}

impl HealthChangedEvent {
    pub fn new(entity: EntityId, previous: i32, current: i32, max: i32) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            previous,
            current,
            max,
        }
    }

    pub fn is_damage(&self) -> bool {
        self.current < self.previous
    }
}

impl EntityDiedEvent {
    pub fn new(entity: EntityId) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
        }
    }
}

impl ItemCollectedEvent {
    pub fn new(item: EntityId, collector: EntityId) -> Self {
        Self {
            header: EventHeader::now(),
            item,
            collector,
        }
    }
}

game_event!(HealthChangedEvent, EntityDiedEvent, ItemCollectedEvent);
