//! Events emitted by the physics system.
//!
//! [`CollisionEnterEvent`] and [`TriggerEnterEvent`] are published at most once
//! per entity pair per frame. [`EntityMovedEvent`] is queued rather than
//! published, so listeners see it after the physics pass has finished.

use glam::Vec2;

use super::bus::EventHeader;
use crate::world::EntityId;

/// Two solid colliders overlapped and were separated.
///
/// `a` is the moving entity that detected the overlap, `b` the obstacle.
#[derive(Debug, Clone)]
pub struct CollisionEnterEvent {
    pub header: EventHeader,
    pub a: EntityId,
    pub b: EntityId,
    pub a_tag: String,
    pub b_tag: String,
}

/// A collider overlapped a trigger. No physical response happens.
#[derive(Debug, Clone)]
pub struct TriggerEnterEvent {
    pub header: EventHeader,
    /// The trigger side of the pair (`a` if both are triggers).
    pub trigger: EntityId,
    pub other: EntityId,
    pub trigger_tag: String,
    pub other_tag: String,
}

/// An entity moved further than the configured threshold this frame.
#[derive(Debug, Clone)]
pub struct EntityMovedEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    pub from: Vec2,
    pub to: Vec2,
}

impl CollisionEnterEvent {
    pub fn new(a: EntityId, b: EntityId, a_tag: String, b_tag: String) -> Self {
        Self {
            header: EventHeader::now(),
            a,
            b,
            a_tag,
            b_tag,
        }
    }

    /// Whether `entity` is one of the two participants.
    pub fn involves(&self, entity: EntityId) -> bool {
        self.a == entity || self.b == entity
    }

    /// The participant that is not `entity`.
    pub fn other(&self, entity: EntityId) -> Option<EntityId> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }
}

impl TriggerEnterEvent {
    pub fn new(trigger: EntityId, other: EntityId, trigger_tag: String, other_tag: String) -> Self {
        Self {
            header: EventHeader::now(),
            trigger,
            other,
            trigger_tag,
            other_tag,
        }
    }
}

impl EntityMovedEvent {
    pub fn new(entity: EntityId, from: Vec2, to: Vec2) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            from,
            to,
        }
    }

    pub fn distance(&self) -> f32 {
        self.from.distance(self.to)
    }
}

game_event!(CollisionEnterEvent, TriggerEnterEvent, EntityMovedEvent);
