//! High-level flow events.

use super::bus::EventHeader;

/// The pause key was pressed while running.
#[derive(Debug, Clone, Default)]
pub struct GamePausedEvent {
    pub header: EventHeader,
}

/// The pause key was pressed while paused.
#[derive(Debug, Clone, Default)]
pub struct GameResumedEvent {
    pub header: EventHeader,
}

/// The scene manager switched the active scene.
#[derive(Debug, Clone)]
pub struct SceneChangedEvent {
    pub header: EventHeader,
    pub from: Option<String>,
    pub to: String,
}

impl SceneChangedEvent {
    pub fn new(from: Option<String>, to: impl Into<String>) -> Self {
        Self {
            header: EventHeader::now(),
            from,
            to: to.into(),
        }
    }
}

game_event!(GamePausedEvent, GameResumedEvent, SceneChangedEvent);
