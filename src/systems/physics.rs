//! Physics: integration, collision detection and separation.
//!
//! Every frame, for each entity with a [`Transform`] and a [`Rigidbody`]:
//!
//! 1. Acceleration (and gravity in platformer mode) is added to velocity,
//!    damping and the speed clamp are applied, then `position += velocity * dt`.
//! 2. If the entity moved further than the configured threshold, an
//!    [`EntityMovedEvent`] is queued.
//! 3. If it also has an enabled [`Collider`], it is tested against every other
//!    collider and against every [`TileCollision`] surface.
//!
//! # Pair rules
//!
//! Two colliders interact when both are enabled and the querying collider's
//! mask shares a bit with the other's layer. Overlaps involving a trigger
//! publish a [`TriggerEnterEvent`] and nothing else. Solid overlaps publish a
//! [`CollisionEnterEvent`] and are then resolved. Each unordered pair reports
//! at most once per frame.
//!
//! # Resolution
//!
//! Only the querying entity is moved, and only if its mass is non-zero. The
//! overlap is resolved along its narrower axis; equal width and height resolve
//! vertically. The entity is placed flush against the obstacle on the side its
//! centre was on before this frame's integration, and its velocity along that
//! axis is zeroed. The other axis is left untouched.
//!
//! Tile surfaces are always solid, never publish events and always resolve.

use glam::Vec2;
use log::trace;
use rustc_hash::FxHashSet;

use crate::aabb::Aabb2;
use crate::components::boxcollider::Collider;
use crate::components::inputcontrolled::InputController;
use crate::components::rigidbody::Rigidbody;
use crate::components::tilecollision::TileCollision;
use crate::components::transform::Transform;
use crate::error::EngineResult;
use crate::events::bus::EventBus;
use crate::events::collision::{CollisionEnterEvent, EntityMovedEvent, TriggerEnterEvent};
use crate::events::gameplay::{EntityDiedEvent, ItemCollectedEvent};
use crate::events::input::EntityDirectionEvent;
use crate::resources::gameconfig::{EngineConfig, PhysicsConfig, PhysicsMode};
use crate::systems::{Frame, System};
use crate::world::{EntityId, World};

pub const PHYSICS_SYSTEM: &str = "physics";

/// Separation axis chosen for an overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Axis to separate along: the narrower side of the overlap, vertical on ties.
pub fn separation_axis(overlap: &Aabb2) -> Axis {
    if overlap.width() < overlap.height() {
        Axis::X
    } else {
        Axis::Y
    }
}

/// Offset that places `moving` flush against `obstacle` along `axis`, on the
/// side `from_center` lies on.
pub fn separation_offset(moving: &Aabb2, obstacle: &Aabb2, axis: Axis, from_center: Vec2) -> Vec2 {
    let center = obstacle.center();
    match axis {
        Axis::X if from_center.x < center.x => Vec2::new(obstacle.min.x - moving.max.x, 0.0),
        Axis::X => Vec2::new(obstacle.max.x - moving.min.x, 0.0),
        Axis::Y if from_center.y < center.y => Vec2::new(0.0, obstacle.min.y - moving.max.y),
        Axis::Y => Vec2::new(0.0, obstacle.max.y - moving.min.y),
    }
}

/// The physics system.
#[derive(Debug, Default)]
pub struct PhysicsSystem;

impl PhysicsSystem {
    pub fn new() -> Self {
        Self
    }

    /// Run one physics step with an explicit configuration.
    pub fn step(
        &mut self,
        world: &mut World,
        bus: &mut EventBus,
        dt: f32,
        config: &PhysicsConfig,
    ) -> EngineResult<()> {
        let bodies = world.query::<(Transform, Rigidbody)>();
        let colliders = world.query::<(Transform, Collider)>();
        let surfaces = world.query::<(Transform, TileCollision)>();
        let mut reported: FxHashSet<(EntityId, EntityId)> = FxHashSet::default();

        for id in bodies {
            let Some((before, after)) = integrate(world, id, dt, config) else {
                continue;
            };
            if before.distance(after) > config.movement_event_threshold {
                bus.queue_event(EntityMovedEvent::new(id, before, after));
            }
            if !collider_enabled(world, id) {
                continue;
            }
            let before_center = previous_center(world, id, before - after);
            for &other in &colliders {
                if other == id {
                    continue;
                }
                collide_pair(world, bus, id, other, before_center, &mut reported);
            }
            for &surface in &surfaces {
                collide_tiles(world, id, surface, before_center);
            }
        }
        Ok(())
    }
}

impl System for PhysicsSystem {
    fn name(&self) -> &str {
        PHYSICS_SYSTEM
    }

    fn subscribe(&mut self, bus: &mut EventBus, config: &EngineConfig) {
        let mode = config.physics.mode;
        bus.subscribe(move |e: &mut EntityDirectionEvent, world: &mut World, _: &mut EventBus| {
            if !world.has_component::<Rigidbody>(e.entity) {
                return Ok(());
            }
            if e.is_stop() {
                match mode {
                    PhysicsMode::TopDown => stop_entity(world, e.entity),
                    PhysicsMode::Platformer => {
                        let mut rb = world.get_component_mut::<Rigidbody>(e.entity)?;
                        rb.velocity.x = 0.0;
                    }
                }
                return Ok(());
            }
            let speed = world
                .get_component::<InputController>(e.entity)
                .map(|c| c.speed)
                .unwrap_or(0.0);
            match mode {
                PhysicsMode::TopDown => move_towards(world, e.entity, e.direction, speed),
                PhysicsMode::Platformer => {
                    let mut rb = world.get_component_mut::<Rigidbody>(e.entity)?;
                    rb.velocity.x = if e.direction.x == 0.0 {
                        0.0
                    } else {
                        e.direction.x.signum() * speed
                    };
                }
            }
            Ok(())
        });
        bus.subscribe(|e: &mut EntityDiedEvent, world: &mut World, _: &mut EventBus| {
            stop_entity(world, e.entity);
            Ok(())
        });
        bus.subscribe(|e: &mut ItemCollectedEvent, world: &mut World, _: &mut EventBus| {
            if world.has_component::<Collider>(e.item) {
                world.get_component_mut::<Collider>(e.item)?.enabled = false;
            }
            Ok(())
        });
    }

    fn update(&mut self, frame: &mut Frame<'_>) -> EngineResult<()> {
        let config = frame.config.physics;
        self.step(frame.world, frame.bus, frame.delta, &config)
    }
}

/// Integrate one body. Returns the position before and after, or `None` if
/// the body is frozen or gone.
fn integrate(world: &mut World, id: EntityId, dt: f32, config: &PhysicsConfig) -> Option<(Vec2, Vec2)> {
    let velocity = {
        let mut rb = world.get_component_mut::<Rigidbody>(id).ok()?;
        if rb.frozen {
            return None;
        }
        let acceleration = rb.acceleration;
        rb.velocity += acceleration * dt;
        if config.mode == PhysicsMode::Platformer && !rb.is_static() {
            rb.velocity += config.gravity * dt;
            rb.velocity *= config.damping;
        }
        rb.clamp_speed();
        rb.velocity
    };
    let mut transform = world.get_component_mut::<Transform>(id).ok()?;
    let before = transform.position;
    transform.position += velocity * dt;
    Some((before, transform.position))
}

fn collider_enabled(world: &World, id: EntityId) -> bool {
    world
        .get_component::<Collider>(id)
        .is_ok_and(|c| c.enabled)
}

/// Centre of the entity's collider box before this frame's integration.
fn previous_center(world: &World, id: EntityId, undo: Vec2) -> Vec2 {
    match (
        world.get_component::<Transform>(id),
        world.get_component::<Collider>(id),
    ) {
        (Ok(t), Ok(c)) => c.aabb(t).center() + undo,
        _ => Vec2::ZERO,
    }
}

fn world_box(world: &World, id: EntityId) -> Option<(Aabb2, Collider)> {
    let transform = world.get_component::<Transform>(id).ok()?;
    let collider = world.get_component::<Collider>(id).ok()?;
    Some((collider.aabb(transform), collider.clone()))
}

fn collide_pair(
    world: &mut World,
    bus: &mut EventBus,
    id: EntityId,
    other: EntityId,
    before_center: Vec2,
    reported: &mut FxHashSet<(EntityId, EntityId)>,
) {
    let (Some((a_box, a)), Some((b_box, b))) = (world_box(world, id), world_box(world, other)) else {
        return;
    };
    if !a.accepts(&b) {
        return;
    }
    if !a_box.intersects(&b_box) {
        return;
    }
    let first = reported.insert((id.min(other), id.max(other)));

    if a.is_trigger || b.is_trigger {
        if first {
            let event = if b.is_trigger {
                TriggerEnterEvent::new(other, id, b.tag, a.tag)
            } else {
                TriggerEnterEvent::new(id, other, a.tag, b.tag)
            };
            bus.publish(world, event);
        }
        return;
    }

    if first {
        bus.publish(world, CollisionEnterEvent::new(id, other, a.tag, b.tag));
    }
    // Handlers may have moved, disabled or removed either side.
    let (Some((a_box, a)), Some((b_box, b))) = (world_box(world, id), world_box(world, other)) else {
        return;
    };
    if !a.accepts(&b) || !a_box.intersects(&b_box) {
        return;
    }
    resolve(world, id, &a_box, &b_box, before_center);
}

fn collide_tiles(world: &mut World, id: EntityId, surface: EntityId, before_center: Vec2) {
    let rects: Vec<Aabb2> = match (
        world.get_component::<Transform>(surface),
        world.get_component::<TileCollision>(surface),
    ) {
        (Ok(t), Ok(tiles)) => tiles.world_rects(t).collect(),
        _ => return,
    };
    for rect in rects {
        let Some((moving, collider)) = world_box(world, id) else {
            return;
        };
        if !collider.enabled {
            return;
        }
        if moving.intersects(&rect) {
            resolve(world, id, &moving, &rect, before_center);
        }
    }
}

/// Push the moving entity out of `obstacle`. Static bodies are left alone.
fn resolve(world: &mut World, id: EntityId, moving: &Aabb2, obstacle: &Aabb2, before_center: Vec2) {
    let Some(overlap) = moving.intersection(obstacle) else {
        return;
    };
    let Ok(mut rb) = world.get_component_mut::<Rigidbody>(id) else {
        return;
    };
    if rb.is_static() {
        return;
    }
    let axis = separation_axis(&overlap);
    match axis {
        Axis::X => rb.velocity.x = 0.0,
        Axis::Y => rb.velocity.y = 0.0,
    }
    let offset = separation_offset(moving, obstacle, axis, before_center);
    if let Ok(mut transform) = world.get_component_mut::<Transform>(id) {
        transform.position += offset;
    }
    trace!("resolved {} along {:?} by {:?}", id, axis, offset);
}

/// Zero the entity's velocity. No-op without a [`Rigidbody`].
pub fn stop_entity(world: &mut World, id: EntityId) {
    if let Ok(mut rb) = world.get_component_mut::<Rigidbody>(id) {
        rb.velocity = Vec2::ZERO;
    }
}

/// Set velocity to `direction` normalized and scaled by `speed`.
/// No-op without a [`Rigidbody`].
pub fn move_towards(world: &mut World, id: EntityId, direction: Vec2, speed: f32) {
    if let Ok(mut rb) = world.get_component_mut::<Rigidbody>(id) {
        rb.velocity = direction.normalize_or_zero() * speed;
    }
}

/// Add `impulse / mass` to velocity. No-op for static bodies or without a
/// [`Rigidbody`].
pub fn apply_impulse(world: &mut World, id: EntityId, impulse: Vec2) {
    if let Ok(mut rb) = world.get_component_mut::<Rigidbody>(id) {
        if !rb.is_static() {
            let mass = rb.mass;
            rb.velocity += impulse / mass;
        }
    }
}

/// Add `(force / mass) * dt` to velocity. No-op for static bodies or without
/// a [`Rigidbody`].
pub fn apply_force(world: &mut World, id: EntityId, force: Vec2, dt: f32) {
    if let Ok(mut rb) = world.get_component_mut::<Rigidbody>(id) {
        if !rb.is_static() {
            let mass = rb.mass;
            rb.velocity += force / mass * dt;
        }
    }
}
