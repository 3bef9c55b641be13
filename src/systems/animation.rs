//! Animation system.
//!
//! - [`AnimationSystem::update`] advances every playing [`Animation`], copies the
//!   shown frame into the entity's [`Sprite`] and publishes looped/completed
//!   events.
//! - [`set_animation`] switches clips explicitly; the sprite shows frame 0 of
//!   the new clip immediately.
//! - The system subscribes reactions that pick clips from movement intents
//!   and from gameplay events (damage, death, pickup).
//!
//! # Direction policy
//!
//! A movement direction selects the horizontal family (`RunRight`, mirrored
//! with `flip_h` when moving left) when `|dx| >= |dy|`, and the vertical family
//! (`RunUp`, mirrored with `flip_v` when moving down) otherwise. A zero
//! direction selects the idle clip of the family currently shown. Committed
//! states (death, despawn, hit, loot) are never interrupted by movement while
//! they play; death and despawn are never interrupted at all.

use glam::Vec2;
use log::debug;

use crate::components::animation::{Animation, AnimationAction, AnimationStep};
use crate::components::sprite::Sprite;
use crate::error::{EngineError, EngineResult};
use crate::events::animation::{
    AnimationCompletedEvent, AnimationLoopedEvent, AnimationStartedEvent,
};
use crate::events::bus::EventBus;
use crate::events::gameplay::{EntityDiedEvent, HealthChangedEvent, ItemCollectedEvent};
use crate::events::input::EntityDirectionEvent;
use crate::resources::gameconfig::EngineConfig;
use crate::systems::{Frame, System};
use crate::world::{EntityId, World};

pub const ANIMATION_SYSTEM: &str = "animation";

#[derive(Debug, Default)]
pub struct AnimationSystem;

impl AnimationSystem {
    pub fn new() -> Self {
        Self
    }

    /// Advance all animations by `dt` seconds.
    pub fn step(&mut self, world: &mut World, bus: &mut EventBus, dt: f32) -> EngineResult<()> {
        for id in world.query::<(Animation,)>() {
            let (step, action) = {
                let Ok(mut anim) = world.get_component_mut::<Animation>(id) else {
                    continue;
                };
                (anim.advance(dt), anim.current)
            };
            match step {
                AnimationStep::Held => continue,
                AnimationStep::Advanced => {}
                AnimationStep::Looped(count) => {
                    bus.publish(world, AnimationLoopedEvent::new(id, action, count));
                }
                AnimationStep::Completed => {
                    bus.publish(world, AnimationCompletedEvent::new(id, action));
                }
            }
            sync_sprite(world, id);
        }
        Ok(())
    }
}

impl System for AnimationSystem {
    fn name(&self) -> &str {
        ANIMATION_SYSTEM
    }

    fn subscribe(&mut self, bus: &mut EventBus, _config: &EngineConfig) {
        bus.subscribe(|e: &mut EntityDirectionEvent, world: &mut World, bus: &mut EventBus| {
            apply_direction(world, bus, e.entity, e.direction)
        });
        bus.subscribe(|e: &mut HealthChangedEvent, world: &mut World, bus: &mut EventBus| {
            if e.is_damage() && e.current > 0 {
                play_reaction(world, bus, e.entity, AnimationAction::Hit)?;
            }
            Ok(())
        });
        bus.subscribe(|e: &mut EntityDiedEvent, world: &mut World, bus: &mut EventBus| {
            play_reaction(world, bus, e.entity, AnimationAction::Death)
        });
        bus.subscribe(|e: &mut ItemCollectedEvent, world: &mut World, bus: &mut EventBus| {
            play_reaction(world, bus, e.collector, AnimationAction::Loot)
        });
    }

    fn update(&mut self, frame: &mut Frame<'_>) -> EngineResult<()> {
        self.step(frame.world, frame.bus, frame.delta)
    }
}

/// Copy the shown frame into the sprite, if the entity has one.
fn sync_sprite(world: &mut World, id: EntityId) {
    let Some(region) = world
        .get_component::<Animation>(id)
        .ok()
        .and_then(|a| a.current_region())
    else {
        return;
    };
    if let Ok(mut sprite) = world.get_component_mut::<Sprite>(id) {
        sprite.region = region;
    }
}

/// Switch the entity to `action` and start it from frame 0.
///
/// Re-selecting the clip that is already playing does nothing. The sprite is
/// updated before this returns and an [`AnimationStartedEvent`] is published.
///
/// # Errors
/// * [`EngineError::AnimationStateNotFound`] if the entity has no clip for `action`.
/// * [`EngineError::ComponentNotFound`] if it has no [`Animation`].
pub fn set_animation(
    world: &mut World,
    bus: &mut EventBus,
    id: EntityId,
    action: AnimationAction,
) -> EngineResult<()> {
    {
        let mut anim = world.get_component_mut::<Animation>(id)?;
        if anim.current == action && anim.playing {
            return Ok(());
        }
        if !anim.restart(action) {
            return Err(EngineError::AnimationStateNotFound { entity: id, action });
        }
    }
    sync_sprite(world, id);
    bus.publish(world, AnimationStartedEvent::new(id, action));
    Ok(())
}

/// Stop and rewind the entity's animation.
pub fn stop_animation(world: &mut World, id: EntityId) -> EngineResult<()> {
    world.get_component_mut::<Animation>(id)?.stop();
    sync_sprite(world, id);
    Ok(())
}

pub fn pause_animation(world: &mut World, id: EntityId) -> EngineResult<()> {
    world.get_component_mut::<Animation>(id)?.pause();
    Ok(())
}

pub fn resume_animation(world: &mut World, id: EntityId) -> EngineResult<()> {
    world.get_component_mut::<Animation>(id)?.resume();
    Ok(())
}

/// Clip for a movement direction, given the clip currently shown.
pub fn direction_action(current: AnimationAction, direction: Vec2) -> AnimationAction {
    if direction == Vec2::ZERO {
        if current.is_vertical() {
            AnimationAction::IdleUp
        } else {
            AnimationAction::IdleRight
        }
    } else if direction.x.abs() >= direction.y.abs() {
        AnimationAction::RunRight
    } else {
        AnimationAction::RunUp
    }
}

/// React to a movement intent: pick the clip and the sprite flips.
///
/// Entities without an [`Animation`] are ignored. If the entity lacks the
/// up-facing clip it falls back to the right-facing one.
pub fn apply_direction(
    world: &mut World,
    bus: &mut EventBus,
    id: EntityId,
    direction: Vec2,
) -> EngineResult<()> {
    let Ok(anim) = world.get_component::<Animation>(id) else {
        return Ok(());
    };
    if !anim.accepts_movement() {
        return Ok(());
    }
    let mut action = direction_action(anim.current, direction);
    if !anim.has_clip(action) {
        action = match action {
            AnimationAction::RunUp => AnimationAction::RunRight,
            AnimationAction::IdleUp => AnimationAction::IdleRight,
            other => other,
        };
    }
    if !anim.has_clip(action) {
        debug!("entity {} has no clip for {:?}", id, action);
        return Ok(());
    }

    if direction != Vec2::ZERO {
        if let Ok(mut sprite) = world.get_component_mut::<Sprite>(id) {
            if action.is_vertical() {
                sprite.flip_v = direction.y > 0.0;
            } else {
                sprite.flip_h = direction.x < 0.0;
                sprite.flip_v = false;
            }
        }
    }
    set_animation(world, bus, id, action)
}

/// Play a gameplay reaction clip if the entity has one and is not already
/// in a terminal state.
fn play_reaction(
    world: &mut World,
    bus: &mut EventBus,
    id: EntityId,
    action: AnimationAction,
) -> EngineResult<()> {
    let Ok(anim) = world.get_component::<Animation>(id) else {
        return Ok(());
    };
    if !anim.has_clip(action) || (anim.current.is_terminal() && action != AnimationAction::Despawn)
    {
        return Ok(());
    }
    set_animation(world, bus, id, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_families() {
        use AnimationAction::*;
        assert_eq!(direction_action(IdleRight, Vec2::new(1.0, 0.0)), RunRight);
        assert_eq!(direction_action(IdleRight, Vec2::new(-1.0, 0.0)), RunRight);
        assert_eq!(direction_action(IdleRight, Vec2::new(0.0, -1.0)), RunUp);
        assert_eq!(direction_action(IdleRight, Vec2::new(0.0, 1.0)), RunUp);
        // Diagonals favour the horizontal family.
        assert_eq!(direction_action(RunUp, Vec2::new(0.7071, 0.7071)), RunRight);
    }

    #[test]
    fn zero_direction_idles_in_current_family() {
        use AnimationAction::*;
        assert_eq!(direction_action(RunUp, Vec2::ZERO), IdleUp);
        assert_eq!(direction_action(RunRight, Vec2::ZERO), IdleRight);
        assert_eq!(direction_action(Emote, Vec2::ZERO), IdleRight);
    }
}
