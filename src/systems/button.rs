//! Button/UI system.
//!
//! Runs every frame, paused or not. It reports raw edges and clickable
//! buttons:
//!
//! - [`KeyPressedEvent`] / [`KeyReleasedEvent`] for every key that changed
//! - [`GamepadButtonEvent`] for every button that changed on a connected pad,
//!   plus releases for whatever a pad held when it disconnected
//! - [`TouchEvent`] for touches that went down or up
//! - [`UiButtonClickedEvent`] for each enabled [`Button`] pressed this frame by
//!   one of its keys, one of its gamepad buttons on any connected pad, or a new
//!   touch inside its area

use glam::Vec2;

use crate::components::button::Button;
use crate::components::transform::Transform;
use crate::error::EngineResult;
use crate::events::bus::EventBus;
use crate::events::input::{GamepadButtonEvent, KeyPressedEvent, KeyReleasedEvent, TouchEvent};
use crate::events::ui::{ClickSource, UiButtonClickedEvent};
use crate::resources::input::{InputTracker, Key, MAX_GAMEPADS};
use crate::systems::{Frame, System};
use crate::world::{EntityId, World};

pub const BUTTON_SYSTEM: &str = "button";

#[derive(Debug, Default)]
pub struct ButtonSystem;

impl ButtonSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn step(&mut self, world: &mut World, bus: &mut EventBus, input: &InputTracker) -> EngineResult<()> {
        publish_key_edges(world, bus, input);
        publish_gamepad_edges(world, bus, input);
        publish_touch_edges(world, bus, input);

        for id in world.query::<(Button,)>() {
            let Some((name, source)) = clicked(world, id, input) else {
                continue;
            };
            bus.publish(world, UiButtonClickedEvent::new(id, name, source));
        }
        Ok(())
    }
}

impl System for ButtonSystem {
    fn name(&self) -> &str {
        BUTTON_SYSTEM
    }

    fn update(&mut self, frame: &mut Frame<'_>) -> EngineResult<()> {
        self.step(frame.world, frame.bus, frame.input)
    }
}

fn publish_key_edges(world: &mut World, bus: &mut EventBus, input: &InputTracker) {
    let mut pressed: Vec<Key> = input
        .current()
        .keys_down
        .iter()
        .filter(|k| !input.previous().is_key_down(**k))
        .copied()
        .collect();
    let mut released: Vec<Key> = input
        .previous()
        .keys_down
        .iter()
        .filter(|k| !input.current().is_key_down(**k))
        .copied()
        .collect();
    pressed.sort_unstable();
    released.sort_unstable();
    for key in pressed {
        bus.publish(world, KeyPressedEvent::new(key));
    }
    for key in released {
        bus.publish(world, KeyReleasedEvent::new(key));
    }
}

fn publish_gamepad_edges(world: &mut World, bus: &mut EventBus, input: &InputTracker) {
    for player in 0..MAX_GAMEPADS {
        let now = &input.current().gamepads[player];
        let before = &input.previous().gamepads[player];
        if now.connected {
            for &button in now.buttons_down.iter().filter(|b| !before.is_down(**b)) {
                bus.publish(world, GamepadButtonEvent::new(player, button, true));
            }
        }
        // A pad unplugged this frame releases everything it held.
        if before.connected {
            for &button in before.buttons_down.iter().filter(|b| !now.is_down(**b)) {
                bus.publish(world, GamepadButtonEvent::new(player, button, false));
            }
        }
    }
}

fn publish_touch_edges(world: &mut World, bus: &mut EventBus, input: &InputTracker) {
    let was_pressed = |id: u64| {
        input
            .previous()
            .touches
            .iter()
            .any(|t| t.id == id && t.pressed)
    };
    for touch in input.current().touches.iter() {
        if touch.pressed && !was_pressed(touch.id) {
            bus.publish(world, TouchEvent::new(touch.id, touch.position, true));
        }
    }
    for touch in input.previous().touches.iter().filter(|t| t.pressed) {
        let still = input
            .current()
            .touches
            .iter()
            .find(|t| t.id == touch.id && t.pressed);
        if still.is_none() {
            let position = input
                .current()
                .touches
                .iter()
                .find(|t| t.id == touch.id)
                .map_or(touch.position, |t| t.position);
            bus.publish(world, TouchEvent::new(touch.id, position, false));
        }
    }
}

/// The first input that pressed button `id` this frame, with the button's name.
fn clicked(world: &World, id: EntityId, input: &InputTracker) -> Option<(String, ClickSource)> {
    let button = world.get_component::<Button>(id).ok()?;
    if !button.enabled {
        return None;
    }
    let source = button
        .keys
        .iter()
        .find(|k| input.key_just_pressed(**k))
        .map(|k| ClickSource::Key(*k))
        .or_else(|| {
            (0..MAX_GAMEPADS).find_map(|player| {
                button
                    .gamepad_buttons
                    .iter()
                    .find(|b| input.button_just_pressed(player, **b))
                    .map(|b| ClickSource::Gamepad {
                        player,
                        button: *b,
                    })
            })
        })
        .or_else(|| {
            let position = world
                .get_component::<Transform>(id)
                .map_or(Vec2::ZERO, |t| t.position);
            let area = button.touch_area(position)?;
            input
                .new_touches_in(&area)
                .next()
                .map(|t| ClickSource::Touch {
                    id: t.id,
                    position: t.position,
                })
        })?;
    Some((button.name.clone(), source))
}
