//! Scene driver and scene registry.
//!
//! A [`Scene`] owns one [`World`], its [`EventBus`], the one-frame input
//! history and the engine configuration, plus the built-in systems and any
//! custom systems the game adds. [`Scene::frame`] runs the fixed per-frame
//! sequence:
//!
//! 1. advance [`WorldTime`]
//! 2. input system, then drain the event queue
//! 3. physics system, then drain
//! 4. animation system
//! 5. button/UI system
//! 6. custom systems in registration order, then drain
//!
//! Rendering is pulled by the host afterwards through [`Scene::render`].
//!
//! A [`SceneManager`] keeps scenes by name and forwards frames to the active
//! one.

use glam::Vec2;
use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::aabb::Aabb2;
use crate::components::animation::AnimationAction;
use crate::components::life::Life;
use crate::components::transform::Transform;
use crate::error::{EngineError, EngineResult};
use crate::events::bus::{EventBus, GameEvent};
use crate::events::entity::{EntityDestroyedEvent, EntitySpawnedEvent};
use crate::events::gameplay::{EntityDiedEvent, HealthChangedEvent};
use crate::events::gamestate::SceneChangedEvent;
use crate::resources::gameconfig::EngineConfig;
use crate::resources::input::{InputSnapshot, InputTracker};
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::{AnimationSystem, ANIMATION_SYSTEM};
use crate::systems::button::{ButtonSystem, BUTTON_SYSTEM};
use crate::systems::input::{InputSystem, INPUT_SYSTEM};
use crate::systems::physics::{PhysicsSystem, PHYSICS_SYSTEM};
use crate::systems::render::{render_world, SpriteRenderer};
use crate::systems::{animation, Frame, System};
use crate::world::{EntityId, World};

const BUILTIN_SYSTEMS: [&str; 4] = [INPUT_SYSTEM, PHYSICS_SYSTEM, ANIMATION_SYSTEM, BUTTON_SYSTEM];

/// One self-contained game scene.
pub struct Scene {
    name: String,
    world: World,
    bus: EventBus,
    input: InputTracker,
    config: EngineConfig,
    input_system: InputSystem,
    physics: PhysicsSystem,
    animation: AnimationSystem,
    button: ButtonSystem,
    custom: Vec<Box<dyn System>>,
    /// Kind names given at spawn, reported again on destroy.
    kinds: FxHashMap<EntityId, String>,
}

impl Scene {
    /// Creates an empty scene and subscribes the built-in systems.
    pub fn new(name: impl Into<String>, config: EngineConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(config.clone());
        let mut bus = EventBus::new();
        bus.set_debug_logging(config.events.debug_logging);

        let mut input_system = InputSystem::new();
        let mut physics = PhysicsSystem::new();
        let mut animation = AnimationSystem::new();
        let mut button = ButtonSystem::new();
        input_system.subscribe(&mut bus, &config);
        physics.subscribe(&mut bus, &config);
        animation.subscribe(&mut bus, &config);
        button.subscribe(&mut bus, &config);

        let name = name.into();
        debug!("scene '{}' created ({} physics)", name, config.physics.mode.as_str());
        Self {
            name,
            world,
            bus,
            input: InputTracker::new(),
            config,
            input_system,
            physics,
            animation,
            button,
            custom: Vec::new(),
            kinds: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// World and bus together, for code that publishes while mutating.
    pub fn parts_mut(&mut self) -> (&mut World, &mut EventBus) {
        (&mut self.world, &mut self.bus)
    }

    pub fn input(&self) -> &InputTracker {
        &self.input
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Adds a custom system after the built-in ones.
    ///
    /// # Errors
    /// [`EngineError::DuplicateRegistration`] if the name is taken by a
    /// built-in or an earlier custom system.
    pub fn add_system(&mut self, mut system: Box<dyn System>) -> EngineResult<()> {
        let name = system.name().to_string();
        if BUILTIN_SYSTEMS.contains(&name.as_str()) || self.custom.iter().any(|s| s.name() == name) {
            return Err(EngineError::DuplicateRegistration {
                what: "system",
                name,
            });
        }
        system.subscribe(&mut self.bus, &self.config);
        debug!("scene '{}': added system '{}'", self.name, name);
        self.custom.push(system);
        Ok(())
    }

    /// Names of all systems in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        BUILTIN_SYSTEMS
            .iter()
            .copied()
            .chain(self.custom.iter().map(|s| s.name()))
            .collect()
    }

    /// Run one frame with this frame's device state and `raw_delta` seconds.
    ///
    /// Entity ids freed during the frame become reusable once it ends, even
    /// when a system fails.
    pub fn frame(&mut self, snapshot: InputSnapshot, raw_delta: f32) -> EngineResult<()> {
        self.input.advance(snapshot);
        let delta = match self.world.get_resource_mut::<WorldTime>() {
            Some(mut time) => time.tick(raw_delta),
            None => raw_delta,
        };

        let result = self.run_systems(delta);
        self.world.end_frame();
        result
    }

    fn run_systems(&mut self, delta: f32) -> EngineResult<()> {
        let mut frame = Frame {
            world: &mut self.world,
            bus: &mut self.bus,
            input: &self.input,
            config: &self.config,
            delta,
        };

        self.input_system.update(&mut frame)?;
        frame.bus.drain_queue(frame.world);

        self.physics.update(&mut frame)?;
        frame.bus.drain_queue(frame.world);

        self.animation.update(&mut frame)?;
        self.button.update(&mut frame)?;
        for system in self.custom.iter_mut() {
            system.update(&mut frame)?;
        }
        frame.bus.drain_queue(frame.world);
        Ok(())
    }

    /// Hand every visible sprite to `renderer`, back to front. Returns the
    /// number of sprites drawn.
    pub fn render(&mut self, renderer: &mut impl SpriteRenderer, camera: Option<&Aabb2>) -> usize {
        render_world(&mut self.world, renderer, camera)
    }

    /// Dispatch `event` now.
    pub fn publish<E: GameEvent>(&mut self, event: E) {
        self.bus.publish(&mut self.world, event);
    }

    /// Defer `event` to the next drain.
    pub fn queue_event<E: GameEvent>(&mut self, event: E) {
        self.bus.queue_event(event);
    }

    /// Creates an entity with a [`Transform`] at `position` and queues an
    /// [`EntitySpawnedEvent`].
    pub fn spawn(&mut self, kind: impl Into<String>, position: Vec2) -> EntityId {
        let kind = kind.into();
        let id = self.world.create_entity_with(Transform::at(position));
        self.bus
            .queue_event(EntitySpawnedEvent::new(id, kind.clone(), position));
        self.kinds.insert(id, kind);
        id
    }

    /// Removes the entity and queues an [`EntityDestroyedEvent`] with its last
    /// position. Unknown ids are ignored.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let last_position = self
            .world
            .get_component::<Transform>(id)
            .map_or(Vec2::ZERO, |t| t.position);
        if !self.world.remove_entity(id) {
            return false;
        }
        let kind = self.kinds.remove(&id).unwrap_or_default();
        self.bus
            .queue_event(EntityDestroyedEvent::new(id, kind, last_position));
        true
    }

    /// Kind name the entity was spawned with.
    pub fn kind_of(&self, id: EntityId) -> Option<&str> {
        self.kinds.get(&id).map(String::as_str)
    }

    /// See [`apply_damage`].
    pub fn apply_damage(&mut self, id: EntityId, amount: i32) -> EngineResult<()> {
        apply_damage(&mut self.world, &mut self.bus, id, amount)
    }

    /// See [`heal`].
    pub fn heal(&mut self, id: EntityId, amount: i32) -> EngineResult<()> {
        heal(&mut self.world, &mut self.bus, id, amount)
    }

    /// See [`animation::set_animation`].
    pub fn set_animation(&mut self, id: EntityId, action: AnimationAction) -> EngineResult<()> {
        animation::set_animation(&mut self.world, &mut self.bus, id, action)
    }

    pub fn stop_animation(&mut self, id: EntityId) -> EngineResult<()> {
        animation::stop_animation(&mut self.world, id)
    }

    pub fn pause_animation(&mut self, id: EntityId) -> EngineResult<()> {
        animation::pause_animation(&mut self.world, id)
    }

    pub fn resume_animation(&mut self, id: EntityId) -> EngineResult<()> {
        animation::resume_animation(&mut self.world, id)
    }

    /// Remove every entity and any pending events. Subscriptions survive.
    pub fn reset(&mut self) {
        self.world.clear();
        self.bus.clear_queue();
        self.kinds.clear();
        self.input = InputTracker::new();
    }
}

/// Take `amount` hit points from the entity's [`Life`].
///
/// Publishes [`HealthChangedEvent`] when the value changes and
/// [`EntityDiedEvent`] when it reaches zero. Usable from custom systems.
pub fn apply_damage(world: &mut World, bus: &mut EventBus, id: EntityId, amount: i32) -> EngineResult<()> {
    let (previous, life) = {
        let mut life = world.get_component_mut::<Life>(id)?;
        let previous = life.damage(amount);
        (previous, *life)
    };
    if previous == life.current {
        return Ok(());
    }
    bus.publish(world, HealthChangedEvent::new(id, previous, life.current, life.max));
    if life.is_dead() {
        info!("entity {} died", id);
        bus.publish(world, EntityDiedEvent::new(id));
    }
    Ok(())
}

/// Restore `amount` hit points, publishing [`HealthChangedEvent`] on change.
pub fn heal(world: &mut World, bus: &mut EventBus, id: EntityId, amount: i32) -> EngineResult<()> {
    let (previous, life) = {
        let mut life = world.get_component_mut::<Life>(id)?;
        let previous = life.heal(amount);
        (previous, *life)
    };
    if previous != life.current {
        bus.publish(world, HealthChangedEvent::new(id, previous, life.current, life.max));
    }
    Ok(())
}

/// Named scenes with one active at a time.
#[derive(Default)]
pub struct SceneManager {
    scenes: FxHashMap<String, Scene>,
    active: Option<String>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// [`EngineError::DuplicateRegistration`] if a scene with the same name exists.
    pub fn register(&mut self, scene: Scene) -> EngineResult<()> {
        if self.scenes.contains_key(scene.name()) {
            return Err(EngineError::DuplicateRegistration {
                what: "scene",
                name: scene.name().to_string(),
            });
        }
        debug!("registered scene '{}'", scene.name());
        self.scenes.insert(scene.name().to_string(), scene);
        Ok(())
    }

    /// Make `name` the active scene and publish a [`SceneChangedEvent`] on it.
    ///
    /// # Errors
    /// [`EngineError::UnknownScene`] if no scene has that name.
    pub fn switch_to(&mut self, name: &str) -> EngineResult<()> {
        let scene = self
            .scenes
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownScene(name.to_string()))?;
        let from = self.active.replace(name.to_string());
        info!(
            "switching scene {} -> {}",
            from.as_deref().unwrap_or("<none>"),
            name
        );
        scene.publish(SceneChangedEvent::new(from, name));
        Ok(())
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Scene> {
        self.active.as_ref().and_then(|n| self.scenes.get(n))
    }

    pub fn active_mut(&mut self) -> Option<&mut Scene> {
        self.active.as_ref().and_then(|n| self.scenes.get_mut(n))
    }

    pub fn get(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Run one frame of the active scene. Does nothing without one.
    pub fn frame(&mut self, snapshot: InputSnapshot, raw_delta: f32) -> EngineResult<()> {
        match self.active_mut() {
            Some(scene) => scene.frame(snapshot, raw_delta),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counter {
        name: &'static str,
        ticks: Rc<RefCell<u32>>,
    }

    impl System for Counter {
        fn name(&self) -> &str {
            self.name
        }

        fn update(&mut self, _frame: &mut Frame<'_>) -> EngineResult<()> {
            *self.ticks.borrow_mut() += 1;
            Ok(())
        }
    }

    fn counter(name: &'static str) -> (Box<dyn System>, Rc<RefCell<u32>>) {
        let ticks = Rc::new(RefCell::new(0));
        (
            Box::new(Counter {
                name,
                ticks: ticks.clone(),
            }),
            ticks,
        )
    }

    #[test]
    fn custom_systems_run_each_frame() {
        let mut scene = Scene::new("test", EngineConfig::new());
        let (system, ticks) = counter("ai");
        scene.add_system(system).unwrap();
        scene.frame(InputSnapshot::new(), 0.016).unwrap();
        scene.frame(InputSnapshot::new(), 0.016).unwrap();
        assert_eq!(*ticks.borrow(), 2);
        assert_eq!(
            scene.system_names(),
            vec!["input", "physics", "animation", "button", "ai"]
        );
    }

    #[test]
    fn duplicate_and_reserved_system_names_are_rejected() {
        let mut scene = Scene::new("test", EngineConfig::new());
        scene.add_system(counter("ai").0).unwrap();
        assert!(matches!(
            scene.add_system(counter("ai").0),
            Err(EngineError::DuplicateRegistration { what: "system", .. })
        ));
        assert!(scene.add_system(counter("physics").0).is_err());
    }

    #[test]
    fn world_time_advances_per_frame() {
        let mut scene = Scene::new("test", EngineConfig::new());
        scene.frame(InputSnapshot::new(), 0.5).unwrap();
        scene.frame(InputSnapshot::new(), 0.25).unwrap();
        let time = scene.world().get_resource::<WorldTime>().unwrap();
        assert_eq!(time.frame, 2);
        assert!((time.elapsed - 0.75).abs() < 1e-6);
    }

    #[test]
    fn destroy_reports_kind_and_last_position() {
        let mut scene = Scene::new("test", EngineConfig::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        scene
            .bus_mut()
            .subscribe(move |e: &mut EntityDestroyedEvent, _: &mut World, _: &mut EventBus| {
                sink.borrow_mut().push((e.kind.clone(), e.last_position));
                Ok(())
            });
        let coin = scene.spawn("coin", Vec2::new(3.0, 4.0));
        assert_eq!(scene.kind_of(coin), Some("coin"));
        assert!(scene.destroy(coin));
        assert!(!scene.destroy(coin));
        assert!(seen.borrow().is_empty());

        scene.frame(InputSnapshot::new(), 0.016).unwrap();
        assert_eq!(*seen.borrow(), vec![("coin".to_string(), Vec2::new(3.0, 4.0))]);
    }

    struct Despawner(EntityId);

    impl System for Despawner {
        fn name(&self) -> &str {
            "despawner"
        }

        fn update(&mut self, frame: &mut Frame<'_>) -> EngineResult<()> {
            frame.world.remove_entity(self.0);
            Err(EngineError::Config("despawner gave up".into()))
        }
    }

    #[test]
    fn failed_frame_still_releases_freed_ids() {
        let mut scene = Scene::new("test", EngineConfig::new());
        let doomed = scene.spawn("crate", Vec2::ZERO);
        scene.add_system(Box::new(Despawner(doomed))).unwrap();

        assert!(scene.frame(InputSnapshot::new(), 0.016).is_err());
        assert!(!scene.world().contains(doomed));
        assert_eq!(scene.spawn("crate", Vec2::ZERO), doomed);
    }

    #[test]
    fn manager_rejects_duplicates_and_unknown_scenes() {
        let mut manager = SceneManager::new();
        manager.register(Scene::new("menu", EngineConfig::new())).unwrap();
        assert!(manager.register(Scene::new("menu", EngineConfig::new())).is_err());
        assert_eq!(
            manager.switch_to("level9").unwrap_err(),
            EngineError::UnknownScene("level9".into())
        );
        assert!(manager.active().is_none());
        manager.frame(InputSnapshot::new(), 0.016).unwrap();

        manager.switch_to("menu").unwrap();
        assert_eq!(manager.active_name(), Some("menu"));
    }
}
