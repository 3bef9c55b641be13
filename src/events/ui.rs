//! Clickable button events.

use glam::Vec2;

use super::bus::EventHeader;
use crate::resources::input::{GamepadButton, Key};
use crate::world::EntityId;

/// What pressed a button.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickSource {
    Key(Key),
    Gamepad { player: usize, button: GamepadButton },
    Touch { id: u64, position: Vec2 },
}

/// A [`Button`](crate::components::button::Button) was pressed this frame.
#[derive(Debug, Clone)]
pub struct UiButtonClickedEvent {
    pub header: EventHeader,
    pub button: EntityId,
    pub name: String,
    pub source: ClickSource,
}

impl UiButtonClickedEvent {
    pub fn new(button: EntityId, name: impl Into<String>, source: ClickSource) -> Self {
        Self {
            header: EventHeader::now(),
            button,
            name: name.into(),
            source,
        }
    }
}

game_event!(UiButtonClickedEvent);
