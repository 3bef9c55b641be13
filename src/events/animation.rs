//! Animation lifecycle events, published by the
//! [`AnimationSystem`](crate::systems::animation::AnimationSystem).

use super::bus::EventHeader;
use crate::components::animation::AnimationAction;
use crate::world::EntityId;

/// A clip was (re)started from frame 0.
#[derive(Debug, Clone)]
pub struct AnimationStartedEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    pub action: AnimationAction,
}

/// A looping clip wrapped back to frame 0.
#[derive(Debug, Clone)]
pub struct AnimationLoopedEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    pub action: AnimationAction,
    /// Loop counter after this wrap.
    pub loop_count: u32,
}

/// A non-looping clip reached its last frame and stopped.
#[derive(Debug, Clone)]
pub struct AnimationCompletedEvent {
    pub header: EventHeader,
    pub entity: EntityId,
    pub action: AnimationAction,
}

impl AnimationStartedEvent {
    pub fn new(entity: EntityId, action: AnimationAction) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            action,
        }
    }
}

impl AnimationLoopedEvent {
    pub fn new(entity: EntityId, action: AnimationAction, loop_count: u32) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            action,
            loop_count,
        }
    }
}

impl AnimationCompletedEvent {
    pub fn new(entity: EntityId, action: AnimationAction) -> Self {
        Self {
            header: EventHeader::now(),
            entity,
            action,
        }
    }
}

game_event!(
    AnimationStartedEvent,
    AnimationLoopedEvent,
    AnimationCompletedEvent
);
