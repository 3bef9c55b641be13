//! Entity registry.
//!
//! [`World`] owns entity identities and component storage. Storage is a
//! `bevy_ecs` world used purely as an archetype table: the registry hands out
//! its own small integer [`EntityId`]s, keeps a slot table mapping them to the
//! backing `bevy_ecs` entities, and recycles freed ids in FIFO order.
//!
//! Every backing entity carries its [`EntityId`] as a component so typed
//! queries can report public ids directly.
//!
//! Freed ids are parked until [`World::end_frame`] and only then offered for
//! reuse, so an id removed during a frame resolves to "no such entity" for
//! every event and system that still names it in that frame.

use std::collections::VecDeque;
use std::fmt;

use bevy_ecs::bundle::Bundle;
use bevy_ecs::entity::Entity;
use bevy_ecs::prelude::{Component, Resource, With};
use bevy_ecs::query::QueryFilter;
use bevy_ecs::world::{FromWorld, Mut, World as EcsWorld};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::components::EngineComponent;
use crate::error::{EngineError, EngineResult};
use crate::resources::pause::PauseState;
use crate::resources::worldtime::WorldTime;

/// Opaque entity identifier handed out by [`World`].
///
/// Ids are weak references: holding one does not keep the entity alive and a
/// recycled id may later name a different entity.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A set of component kinds that can be queried together.
///
/// Implemented for tuples of one to five [`EngineComponent`]s, so
/// `world.query::<(Transform, Rigidbody)>()` lists every entity owning both.
pub trait ComponentSet {
    type Filter: QueryFilter;
}

macro_rules! impl_component_set {
    ($($kind:ident),+) => {
        impl<$($kind: EngineComponent),+> ComponentSet for ($($kind,)+) {
            type Filter = ($(With<$kind>,)+);
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);

/// Entity registry and component store.
pub struct World {
    ecs: EcsWorld,
    slots: Vec<Option<Entity>>,
    recycled: VecDeque<EntityId>,
    freed_this_frame: Vec<EntityId>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty registry with the engine resources ([`WorldTime`],
    /// [`PauseState`]) initialized.
    pub fn new() -> Self {
        let mut ecs = EcsWorld::new();
        ecs.init_resource::<WorldTime>();
        ecs.init_resource::<PauseState>();
        Self {
            ecs,
            slots: Vec::new(),
            recycled: VecDeque::new(),
            freed_this_frame: Vec::new(),
        }
    }

    /// Creates an entity with no components.
    ///
    /// The oldest recycled id is reused first; otherwise the next sequential
    /// id is allocated. Ids freed in the current frame are not candidates.
    pub fn create_entity(&mut self) -> EntityId {
        self.create_entity_with(())
    }

    /// Creates an entity with `bundle` attached from the start.
    pub fn create_entity_with<B: Bundle>(&mut self, bundle: B) -> EntityId {
        let id = match self.recycled.pop_front() {
            Some(id) => id,
            None => {
                let id = EntityId(self.slots.len() as u32);
                self.slots.push(None);
                id
            }
        };
        let entity = self.ecs.spawn((id, bundle)).id();
        self.slots[id.index()] = Some(entity);
        debug!("created entity {}", id);
        id
    }

    /// Removes an entity and all of its components. Unknown ids are ignored.
    ///
    /// Returns whether anything was removed. The id becomes reusable after
    /// the next [`World::end_frame`].
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.slots.get_mut(id.index()).and_then(Option::take) else {
            return false;
        };
        self.ecs.despawn(entity);
        self.freed_this_frame.push(id);
        debug!("removed entity {}", id);
        true
    }

    /// Closes the frame: ids removed since the last call join the recycle
    /// queue in removal order.
    pub fn end_frame(&mut self) {
        if !self.freed_this_frame.is_empty() {
            debug!("recycling {} entity ids", self.freed_this_frame.len());
        }
        self.recycled.extend(self.freed_this_frame.drain(..));
    }

    /// Whether `id` names a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.backing(id).is_some()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live entity ids in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| EntityId(i as u32))
    }

    /// Attaches `value` to the entity, replacing any existing component of
    /// the same kind.
    pub fn add_component<K: EngineComponent>(&mut self, id: EntityId, value: K) -> EngineResult<()> {
        let entity = self
            .backing(id)
            .ok_or(EngineError::InvalidEntityReference(id))?;
        self.ecs.entity_mut(entity).insert(value);
        Ok(())
    }

    pub fn has_component<K: EngineComponent>(&self, id: EntityId) -> bool {
        self.backing(id)
            .is_some_and(|entity| self.ecs.get::<K>(entity).is_some())
    }

    /// Reads a component.
    ///
    /// # Errors
    /// * [`EngineError::InvalidEntityReference`] if the entity does not exist.
    /// * [`EngineError::ComponentNotFound`] if it exists without a `K`.
    pub fn get_component<K: EngineComponent>(&self, id: EntityId) -> EngineResult<&K> {
        let entity = self
            .backing(id)
            .ok_or(EngineError::InvalidEntityReference(id))?;
        self.ecs
            .get::<K>(entity)
            .ok_or(EngineError::ComponentNotFound {
                entity: id,
                kind: K::KIND,
            })
    }

    /// Mutable counterpart of [`World::get_component`].
    pub fn get_component_mut<K: EngineComponent>(&mut self, id: EntityId) -> EngineResult<Mut<'_, K>> {
        let entity = self
            .backing(id)
            .ok_or(EngineError::InvalidEntityReference(id))?;
        self.ecs
            .get_mut::<K>(entity)
            .ok_or(EngineError::ComponentNotFound {
                entity: id,
                kind: K::KIND,
            })
    }

    /// Lists every entity owning all kinds in `S`, in ascending id order.
    ///
    /// The result is a snapshot: systems iterate it while mutating
    /// components through `get_component_mut`.
    pub fn query<S: ComponentSet>(&mut self) -> Vec<EntityId> {
        let mut state = self.ecs.query_filtered::<&EntityId, S::Filter>();
        let mut ids: Vec<EntityId> = state.iter(&self.ecs).copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Removes every entity and forgets recycled ids.
    pub fn clear(&mut self) {
        for entity in self.slots.drain(..).flatten() {
            self.ecs.despawn(entity);
        }
        self.recycled.clear();
        self.freed_this_frame.clear();
    }

    pub fn insert_resource<R: Resource>(&mut self, resource: R) {
        self.ecs.insert_resource(resource);
    }

    pub fn init_resource<R: Resource + FromWorld>(&mut self) {
        self.ecs.init_resource::<R>();
    }

    pub fn get_resource<R: Resource>(&self) -> Option<&R> {
        self.ecs.get_resource::<R>()
    }

    pub fn get_resource_mut<R: Resource>(&mut self) -> Option<Mut<'_, R>> {
        self.ecs.get_resource_mut::<R>()
    }

    fn backing(&self, id: EntityId) -> Option<Entity> {
        self.slots.get(id.index()).copied().flatten()
    }
}
