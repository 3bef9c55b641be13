//! Event bus tests: ordering, the handled flag, reentrancy and failure isolation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use framestep::error::EngineError;
use framestep::events::bus::{EventBus, EventHeader, GameEvent};
use framestep::world::{EntityId, World};

#[derive(Debug, Default)]
struct Hit {
    header: EventHeader,
    n: u32,
}

impl GameEvent for Hit {
    fn header(&self) -> &EventHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut EventHeader {
        &mut self.header
    }
}

#[derive(Debug, Default)]
struct Miss {
    header: EventHeader,
}

impl GameEvent for Miss {
    fn header(&self) -> &EventHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut EventHeader {
        &mut self.header
    }
}

fn hit(n: u32) -> Hit {
    Hit {
        header: EventHeader::now(),
        n,
    }
}

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn handled_event_skips_later_handlers() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let calls = log();

    let c = calls.clone();
    bus.subscribe(move |e: &mut Hit, _: &mut World, _: &mut EventBus| {
        c.borrow_mut().push("h1".into());
        e.set_handled();
        Ok(())
    });
    let c = calls.clone();
    bus.subscribe(move |_: &mut Hit, _: &mut World, _: &mut EventBus| {
        c.borrow_mut().push("h2".into());
        Ok(())
    });

    bus.publish(&mut world, hit(1));
    bus.publish(&mut world, hit(2));
    assert_eq!(*calls.borrow(), vec!["h1", "h1"]);
}

#[test]
fn handler_republishing_its_own_event_is_queued() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let depth = Rc::new(Cell::new(0u32));
    let max_depth = Rc::new(Cell::new(0u32));
    let seen = log();

    let (d, m, s) = (depth.clone(), max_depth.clone(), seen.clone());
    bus.subscribe(move |e: &mut Hit, world: &mut World, bus: &mut EventBus| {
        d.set(d.get() + 1);
        m.set(m.get().max(d.get()));
        s.borrow_mut().push(format!("hit{}", e.n));
        if e.n < 3 {
            bus.publish(world, hit(e.n + 1));
        }
        d.set(d.get() - 1);
        Ok(())
    });

    bus.publish(&mut world, hit(1));
    assert_eq!(*seen.borrow(), vec!["hit1"]);
    assert_eq!(bus.queued_len(), 1);

    bus.drain_queue(&mut world);
    assert_eq!(*seen.borrow(), vec!["hit1", "hit2", "hit3"]);
    assert_eq!(max_depth.get(), 1);
    assert_eq!(bus.queued_len(), 0);
    assert!(!bus.is_dispatching());
}

#[test]
fn publishing_another_type_inside_a_handler_is_queued_too() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let seen = log();

    let s = seen.clone();
    bus.subscribe(move |_: &mut Hit, world: &mut World, bus: &mut EventBus| {
        bus.publish(world, Miss::default());
        s.borrow_mut().push("hit".into());
        Ok(())
    });
    let s = seen.clone();
    bus.subscribe(move |_: &mut Miss, _: &mut World, _: &mut EventBus| {
        s.borrow_mut().push("miss".into());
        Ok(())
    });

    bus.publish(&mut world, hit(1));
    assert_eq!(*seen.borrow(), vec!["hit"]);
    assert_eq!(bus.queued_names().collect::<Vec<_>>(), vec!["Miss"]);

    bus.drain_queue(&mut world);
    assert_eq!(*seen.borrow(), vec!["hit", "miss"]);
}

#[test]
fn drain_runs_until_empty_in_fifo_order() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let seen = log();

    let s = seen.clone();
    bus.subscribe(move |e: &mut Hit, _: &mut World, bus: &mut EventBus| {
        s.borrow_mut().push(format!("hit{}", e.n));
        if e.n == 1 {
            bus.queue_event(Miss::default());
        }
        Ok(())
    });
    let s = seen.clone();
    bus.subscribe(move |_: &mut Miss, _: &mut World, _: &mut EventBus| {
        s.borrow_mut().push("miss".into());
        Ok(())
    });

    bus.queue_event(hit(1));
    bus.queue_event(hit(2));
    assert!(seen.borrow().is_empty());
    bus.drain_queue(&mut world);
    assert_eq!(*seen.borrow(), vec!["hit1", "hit2", "miss"]);
}

#[test]
fn failing_handlers_are_isolated() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let seen = log();

    bus.subscribe(|_: &mut Hit, _: &mut World, _: &mut EventBus| {
        Err(EngineError::Config("broken reaction".into()))
    });
    bus.subscribe(|e: &mut Hit, _: &mut World, _: &mut EventBus| {
        if e.n == 2 {
            panic!("handler blew up");
        }
        Ok(())
    });
    let s = seen.clone();
    bus.subscribe(move |e: &mut Hit, _: &mut World, _: &mut EventBus| {
        s.borrow_mut().push(format!("hit{}", e.n));
        Ok(())
    });
    let s = seen.clone();
    bus.subscribe(move |_: &mut Miss, _: &mut World, _: &mut EventBus| {
        s.borrow_mut().push("miss".into());
        Ok(())
    });

    bus.queue_event(hit(1));
    bus.queue_event(hit(2));
    bus.queue_event(Miss::default());
    bus.drain_queue(&mut world);

    assert_eq!(*seen.borrow(), vec!["hit1", "hit2", "miss"]);
    // Two errors plus one panic.
    assert_eq!(bus.stats().handler_failures, 3);
    assert!(!bus.is_draining());
}

#[test]
fn stale_entity_errors_are_not_failures() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let gone = world.create_entity();
    world.remove_entity(gone);

    bus.subscribe(move |_: &mut Hit, world: &mut World, _: &mut EventBus| {
        world.get_component::<framestep::components::life::Life>(gone)?;
        Ok(())
    });
    bus.publish(&mut world, hit(1));
    assert_eq!(bus.stats().handler_failures, 0);
    assert_eq!(bus.dispatch_count::<Hit>(), 1);
}

#[test]
fn handlers_see_world_changes_from_earlier_handlers() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let target = world.create_entity();
    world
        .add_component(target, framestep::components::life::Life::new(5))
        .unwrap();

    bus.subscribe(move |_: &mut Hit, world: &mut World, _: &mut EventBus| {
        world
            .get_component_mut::<framestep::components::life::Life>(target)?
            .damage(2);
        Ok(())
    });
    let observed = Rc::new(Cell::new(0));
    let o = observed.clone();
    bus.subscribe(move |_: &mut Hit, world: &mut World, _: &mut EventBus| {
        o.set(world.get_component::<framestep::components::life::Life>(target)?.current);
        Ok(())
    });

    bus.publish(&mut world, hit(1));
    assert_eq!(observed.get(), 3);
}

#[test]
fn same_handler_logic_on_two_event_types_is_independent() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let count = Rc::new(Cell::new(0));

    let c = count.clone();
    let on_hit = bus.subscribe(move |_: &mut Hit, _: &mut World, _: &mut EventBus| {
        c.set(c.get() + 1);
        Ok(())
    });
    let c = count.clone();
    bus.subscribe(move |_: &mut Miss, _: &mut World, _: &mut EventBus| {
        c.set(c.get() + 1);
        Ok(())
    });

    assert!(bus.unsubscribe::<Hit>(on_hit));
    assert!(!bus.unsubscribe::<Miss>(on_hit));
    bus.publish(&mut world, hit(1));
    bus.publish(&mut world, Miss::default());
    assert_eq!(count.get(), 1);
    assert_eq!(bus.subscriber_count::<Hit>(), 0);
    assert_eq!(bus.subscriber_count::<Miss>(), 1);
}

#[test]
fn entity_ids_in_events_are_weak() {
    let mut world = World::new();
    let mut bus = EventBus::new();
    let doomed = world.create_entity();

    #[derive(Debug)]
    struct Poke {
        header: EventHeader,
        target: EntityId,
    }
    impl GameEvent for Poke {
        fn header(&self) -> &EventHeader {
            &self.header
        }
        fn header_mut(&mut self) -> &mut EventHeader {
            &mut self.header
        }
    }

    let resolved = Rc::new(Cell::new(true));
    let r = resolved.clone();
    bus.subscribe(move |e: &mut Poke, world: &mut World, _: &mut EventBus| {
        r.set(world.contains(e.target));
        Ok(())
    });

    bus.queue_event(Poke {
        header: EventHeader::now(),
        target: doomed,
    });
    world.remove_entity(doomed);
    bus.drain_queue(&mut world);
    assert!(!resolved.get());
}
