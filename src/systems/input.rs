//! Input system.
//!
//! Turns device state into intents for every entity with an
//! [`InputController`]:
//!
//! - an [`EntityDirectionEvent`] with the normalized direction every frame the
//!   controller is steering, and one zero-direction event when it stops
//! - an [`InputActionEvent`] when the action or jump binding is pressed
//!
//! The configured pause key toggles the game between paused and running by
//! publishing [`GamePausedEvent`] / [`GameResumedEvent`]; the handlers this
//! system subscribes flip [`PauseState`]. While paused, controllers publish
//! nothing except a final stop for anything that was moving. The pause key
//! itself keeps working.

use glam::Vec2;
use log::info;

use crate::components::inputcontrolled::InputController;
use crate::error::EngineResult;
use crate::events::bus::EventBus;
use crate::events::gamestate::{GamePausedEvent, GameResumedEvent};
use crate::events::input::{EntityDirectionEvent, InputAction, InputActionEvent};
use crate::resources::gameconfig::EngineConfig;
use crate::resources::input::InputTracker;
use crate::resources::pause::PauseState;
use crate::systems::{Frame, System};
use crate::world::World;

pub const INPUT_SYSTEM: &str = "input";

#[derive(Debug, Default)]
pub struct InputSystem;

impl InputSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        input: &InputTracker,
        config: &EngineConfig,
    ) -> EngineResult<()> {
        if input.key_just_pressed(config.input.pause_key) {
            if is_paused(world) {
                bus.publish(world, GameResumedEvent::default());
            } else {
                bus.publish(world, GamePausedEvent::default());
            }
        }
        let paused = is_paused(world);

        for id in world.query::<(InputController,)>() {
            let Ok(controller) = world.get_component::<InputController>(id) else {
                continue;
            };
            let last = controller.last_direction;
            let direction = if paused {
                Vec2::ZERO
            } else {
                controller
                    .read_direction(input, config.input.gamepad_dead_zone)
                    .normalize_or_zero()
            };
            let action = !paused && controller.action_just_pressed(input);
            let jump = !paused && controller.jump_just_pressed(input);

            if let Ok(mut controller) = world.get_component_mut::<InputController>(id) {
                controller.last_direction = direction;
            }
            if direction != Vec2::ZERO || last != Vec2::ZERO {
                bus.publish(world, EntityDirectionEvent::new(id, direction));
            }
            if action {
                bus.publish(world, InputActionEvent::new(id, InputAction::Action, true));
            }
            if jump {
                bus.publish(world, InputActionEvent::new(id, InputAction::Jump, true));
            }
        }
        Ok(())
    }
}

impl System for InputSystem {
    fn name(&self) -> &str {
        INPUT_SYSTEM
    }

    fn subscribe(&mut self, bus: &mut EventBus, _config: &EngineConfig) {
        bus.subscribe(|_: &mut GamePausedEvent, world: &mut World, _: &mut EventBus| {
            set_paused(world, true);
            Ok(())
        });
        bus.subscribe(|_: &mut GameResumedEvent, world: &mut World, _: &mut EventBus| {
            set_paused(world, false);
            Ok(())
        });
    }

    fn update(&mut self, frame: &mut Frame<'_>) -> EngineResult<()> {
        self.step(frame.world, frame.bus, frame.input, frame.config)
    }
}

fn is_paused(world: &World) -> bool {
    world
        .get_resource::<PauseState>()
        .is_some_and(|p| p.is_paused())
}

fn set_paused(world: &mut World, paused: bool) {
    match world.get_resource_mut::<PauseState>() {
        Some(mut state) => state.paused = paused,
        None => world.insert_resource(PauseState { paused }),
    }
    info!("game {}", if paused { "paused" } else { "resumed" });
}
