//! Entity registry tests: id recycling, component uniqueness and queries.

use glam::Vec2;
use rustc_hash::FxHashSet;

use framestep::components::boxcollider::Collider;
use framestep::components::life::Life;
use framestep::components::rigidbody::Rigidbody;
use framestep::components::transform::Transform;
use framestep::error::EngineError;
use framestep::world::{EntityId, World};

#[test]
fn removed_ids_are_reused_before_new_ones() {
    const N: usize = 16;
    let mut world = World::new();
    let first: Vec<EntityId> = (0..N).map(|_| world.create_entity()).collect();
    for id in &first {
        assert!(world.remove_entity(*id));
    }
    assert!(world.is_empty());
    world.end_frame();

    let second: Vec<EntityId> = (0..N).map(|_| world.create_entity()).collect();
    let a: FxHashSet<EntityId> = first.iter().copied().collect();
    let b: FxHashSet<EntityId> = second.iter().copied().collect();
    assert_eq!(a, b);
    // FIFO: reused in removal order.
    assert_eq!(first, second);
    assert_eq!(world.len(), N);
}

#[test]
fn id_count_never_exceeds_outstanding_entities() {
    let mut world = World::new();
    let mut seen = FxHashSet::default();
    for _ in 0..10 {
        let batch: Vec<EntityId> = (0..4).map(|_| world.create_entity()).collect();
        seen.extend(batch.iter().copied());
        for id in batch {
            world.remove_entity(id);
        }
        world.end_frame();
    }
    assert_eq!(seen.len(), 4);
}

#[test]
fn adding_a_component_twice_keeps_the_second_value() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add_component(e, Life::new(3)).unwrap();
    world.add_component(e, Life::new(9)).unwrap();

    assert_eq!(world.get_component::<Life>(e).unwrap().max, 9);
    assert_eq!(world.query::<(Life,)>(), vec![e]);
}

#[test]
fn stale_id_is_invalid_until_recycled_at_frame_end() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add_component(e, Transform::at(Vec2::new(1.0, 1.0))).unwrap();
    world.remove_entity(e);

    assert_eq!(
        world.get_component::<Transform>(e).unwrap_err(),
        EngineError::InvalidEntityReference(e)
    );
    assert!(!world.contains(e));

    // Still parked within the same frame.
    let other = world.create_entity();
    assert_ne!(other, e);
    world.end_frame();

    let reused = world.create_entity();
    assert_eq!(reused, e);
    assert!(matches!(
        world.get_component::<Transform>(reused),
        Err(EngineError::ComponentNotFound { .. })
    ));
}

#[test]
fn query_lists_owners_of_every_kind_in_stable_order() {
    let mut world = World::new();
    let mut movers = Vec::new();
    for i in 0..6 {
        let e = world.create_entity();
        world.add_component(e, Transform::default()).unwrap();
        if i % 2 == 0 {
            world.add_component(e, Rigidbody::default()).unwrap();
            world.add_component(e, Collider::new(4.0, 4.0)).unwrap();
            movers.push(e);
        }
    }
    let first = world.query::<(Transform, Rigidbody, Collider)>();
    let again = world.query::<(Collider, Transform, Rigidbody)>();
    assert_eq!(first, movers);
    assert_eq!(first, again);
    assert_eq!(world.query::<(Transform,)>().len(), 6);
}

#[test]
fn clear_forgets_everything() {
    let mut world = World::new();
    for _ in 0..3 {
        let e = world.create_entity();
        world.add_component(e, Rigidbody::default()).unwrap();
    }
    world.clear();
    assert!(world.is_empty());
    assert!(world.query::<(Rigidbody,)>().is_empty());
    assert_eq!(world.create_entity(), EntityId(0));
}
