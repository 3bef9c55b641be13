//! Typed publish/subscribe with a deferred FIFO queue.
//!
//! Handlers are registered per event type and run in subscription order.
//! Every handler receives the event, the [`World`] and the bus itself, so a
//! reaction can mutate components and publish follow-up events.
//!
//! # Dispatch rules
//!
//! * [`EventBus::publish`] dispatches synchronously when no dispatch is in
//!   progress. If a handler is already running (immediate dispatch or a
//!   drain), the event is appended to the queue instead, so dispatch never
//!   nests.
//! * [`EventBus::queue_event`] always appends to the queue.
//! * [`EventBus::drain_queue`] dispatches queued events in FIFO order until
//!   the queue is empty, including events queued by the handlers it runs.
//! * A handler that sets the event's handled flag stops the remaining handlers
//!   for that event only.
//! * A handler returning an error, or panicking, is logged and skipped. The
//!   next handler still runs and the queue is left intact.
//!
//! Queued events are stored type-erased together with a monomorphized invoker
//! that restores the concrete type when the event is drained.

use std::any::{Any, TypeId, type_name};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use log::{debug, error};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{EngineError, EngineResult};
use crate::world::World;

/// Metadata carried by every event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventHeader {
    /// When the event was created.
    pub timestamp: Instant,
    handled: bool,
}

impl Default for EventHeader {
    fn default() -> Self {
        Self::now()
    }
}

impl EventHeader {
    pub fn now() -> Self {
        Self {
            timestamp: Instant::now(),
            handled: false,
        }
    }
}

/// A record of a single occurrence that can travel through the [`EventBus`].
pub trait GameEvent: fmt::Debug + 'static {
    fn header(&self) -> &EventHeader;
    fn header_mut(&mut self) -> &mut EventHeader;

    fn is_handled(&self) -> bool {
        self.header().handled
    }

    /// Stop later handlers of this event from running.
    fn set_handled(&mut self) {
        self.header_mut().handled = true;
    }

    fn timestamp(&self) -> Instant {
        self.header().timestamp
    }
}

/// Token returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type Handler<E> = Box<dyn FnMut(&mut E, &mut World, &mut EventBus) -> EngineResult<()>>;

struct Channel<E: GameEvent> {
    handlers: Vec<(HandlerId, Handler<E>)>,
}

struct QueuedEvent {
    name: &'static str,
    payload: Box<dyn Any>,
    invoke: fn(&mut EventBus, &mut World, Box<dyn Any>),
}

fn invoke_queued<E: GameEvent>(bus: &mut EventBus, world: &mut World, payload: Box<dyn Any>) {
    if let Ok(event) = payload.downcast::<E>() {
        bus.dispatch(world, *event);
    }
}

/// Short type name used in logs and statistics.
pub fn event_name<E: 'static>() -> &'static str {
    let full = type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Counters kept by the bus.
#[derive(Debug, Clone, Default)]
pub struct BusStats {
    /// Events dispatched to handlers, immediately or from the queue.
    pub dispatched: u64,
    /// Events appended to the queue.
    pub queued: u64,
    /// Handler errors and panics.
    pub handler_failures: u64,
    /// Dispatch count per event type name.
    pub per_type: FxHashMap<&'static str, u64>,
}

/// Handlers of the event type currently being dispatched.
struct ActiveDispatch {
    type_id: TypeId,
    ids: Vec<HandlerId>,
}

/// The event bus.
#[derive(Default)]
pub struct EventBus {
    channels: FxHashMap<TypeId, Box<dyn Any>>,
    queue: VecDeque<QueuedEvent>,
    next_handler: u64,
    depth: u32,
    draining: bool,
    active: Option<ActiveDispatch>,
    pending_removals: FxHashSet<HandlerId>,
    stats: BusStats,
    debug_logging: bool,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.len())
            .field("queued", &self.queue.len())
            .field("draining", &self.draining)
            .field("stats", &self.stats)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every publish and queue at debug level.
    pub fn set_debug_logging(&mut self, enabled: bool) {
        self.debug_logging = enabled;
    }

    /// Register `handler` for events of type `E`.
    pub fn subscribe<E, F>(&mut self, handler: F) -> HandlerId
    where
        E: GameEvent,
        F: FnMut(&mut E, &mut World, &mut EventBus) -> EngineResult<()> + 'static,
    {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        if let Some(channel) = self.channel_mut::<E>() {
            channel.handlers.push((id, Box::new(handler)));
        }
        id
    }

    /// Remove a handler previously registered for `E`.
    ///
    /// Safe to call from inside a handler, including the handler itself; the
    /// removal takes effect before the next handler of `E` would run.
    pub fn unsubscribe<E: GameEvent>(&mut self, id: HandlerId) -> bool {
        if let Some(channel) = self.channel_mut::<E>() {
            let before = channel.handlers.len();
            channel.handlers.retain(|(hid, _)| *hid != id);
            if channel.handlers.len() != before {
                return true;
            }
        }
        let in_flight = self
            .active
            .as_ref()
            .is_some_and(|a| a.type_id == TypeId::of::<E>() && a.ids.contains(&id));
        in_flight && self.pending_removals.insert(id)
    }

    /// Number of handlers registered for `E`.
    pub fn subscriber_count<E: GameEvent>(&self) -> usize {
        let listed = self.channel::<E>().map_or(0, |c| c.handlers.len());
        let in_flight = match &self.active {
            Some(a) if a.type_id == TypeId::of::<E>() => a
                .ids
                .iter()
                .filter(|id| !self.pending_removals.contains(id))
                .count(),
            _ => 0,
        };
        listed + in_flight
    }

    /// Dispatch `event` now, or queue it if a dispatch is already running.
    pub fn publish<E: GameEvent>(&mut self, world: &mut World, event: E) {
        if self.is_dispatching() {
            self.queue_event(event);
            return;
        }
        if self.debug_logging {
            debug!("publish {} {:?}", event_name::<E>(), event);
        }
        self.dispatch(world, event);
    }

    /// Append `event` to the FIFO queue.
    pub fn queue_event<E: GameEvent>(&mut self, event: E) {
        if self.debug_logging {
            debug!("queue {} {:?}", event_name::<E>(), event);
        }
        self.stats.queued += 1;
        self.queue.push_back(QueuedEvent {
            name: event_name::<E>(),
            payload: Box::new(event),
            invoke: invoke_queued::<E>,
        });
    }

    /// Dispatch queued events until the queue is empty.
    ///
    /// Does nothing when called from inside a handler; the running dispatch
    /// or drain will get to the queue.
    pub fn drain_queue(&mut self, world: &mut World) {
        if self.is_dispatching() {
            return;
        }
        self.draining = true;
        while let Some(queued) = self.queue.pop_front() {
            if self.debug_logging {
                debug!("drain {}", queued.name);
            }
            (queued.invoke)(self, world, queued.payload);
        }
        self.draining = false;
    }

    /// Whether the bus is inside a handler or a drain.
    pub fn is_dispatching(&self) -> bool {
        self.draining || self.depth > 0
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Names of queued events, oldest first.
    pub fn queued_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.queue.iter().map(|q| q.name)
    }

    pub fn stats(&self) -> &BusStats {
        &self.stats
    }

    /// How many `E` events have been dispatched.
    pub fn dispatch_count<E: GameEvent>(&self) -> u64 {
        self.stats
            .per_type
            .get(event_name::<E>())
            .copied()
            .unwrap_or(0)
    }

    /// Drop queued events without dispatching them.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Drop all handlers, queued events and statistics.
    ///
    /// From inside a handler, the handlers still waiting in the running
    /// dispatch are skipped and dropped with the rest.
    pub fn clear(&mut self) {
        self.channels.clear();
        self.queue.clear();
        self.stats = BusStats::default();
        if let Some(active) = &self.active {
            self.pending_removals.extend(active.ids.iter().copied());
        }
    }

    fn dispatch<E: GameEvent>(&mut self, world: &mut World, mut event: E) {
        let name = event_name::<E>();
        self.stats.dispatched += 1;
        *self.stats.per_type.entry(name).or_insert(0) += 1;

        let mut handlers = match self.channel_mut::<E>() {
            Some(channel) => std::mem::take(&mut channel.handlers),
            None => return,
        };
        if handlers.is_empty() {
            return;
        }
        self.active = Some(ActiveDispatch {
            type_id: TypeId::of::<E>(),
            ids: handlers.iter().map(|(id, _)| *id).collect(),
        });
        self.depth += 1;

        for (id, handler) in handlers.iter_mut() {
            if self.pending_removals.contains(id) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&mut event, world, self)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(EngineError::InvalidEntityReference(entity))) => {
                    debug!("{name} handler skipped: entity {entity} no longer exists");
                }
                Ok(Err(err)) => {
                    self.stats.handler_failures += 1;
                    let failure = EngineError::HandlerFailure {
                        event: name,
                        message: err.to_string(),
                    };
                    error!("{failure}");
                }
                Err(panic) => {
                    self.stats.handler_failures += 1;
                    let failure = EngineError::HandlerFailure {
                        event: name,
                        message: panic_message(panic.as_ref()),
                    };
                    error!("{failure}");
                }
            }
            if event.is_handled() {
                break;
            }
        }

        self.depth -= 1;
        handlers.retain(|(id, _)| !self.pending_removals.contains(id));
        if let Some(active) = self.active.take() {
            for id in &active.ids {
                self.pending_removals.remove(id);
            }
        }
        // Handlers subscribed during dispatch run after the existing ones.
        if let Some(channel) = self.channel_mut::<E>() {
            handlers.append(&mut channel.handlers);
            channel.handlers = handlers;
        }
    }

    fn channel<E: GameEvent>(&self) -> Option<&Channel<E>> {
        self.channels
            .get(&TypeId::of::<E>())
            .and_then(|c| c.downcast_ref::<Channel<E>>())
    }

    fn channel_mut<E: GameEvent>(&mut self) -> Option<&mut Channel<E>> {
        self.channels
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Channel::<E> { handlers: Vec::new() }))
            .downcast_mut::<Channel<E>>()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Ping {
        header: EventHeader,
        n: u32,
    }

    impl GameEvent for Ping {
        fn header(&self) -> &EventHeader {
            &self.header
        }
        fn header_mut(&mut self) -> &mut EventHeader {
            &mut self.header
        }
    }

    #[derive(Debug, Default)]
    struct Pong {
        header: EventHeader,
    }

    impl GameEvent for Pong {
        fn header(&self) -> &EventHeader {
            &self.header
        }
        fn header_mut(&mut self) -> &mut EventHeader {
            &mut self.header
        }
    }

    fn ping(n: u32) -> Ping {
        Ping {
            header: EventHeader::now(),
            n,
        }
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(log: &Log, tag: &'static str) -> impl FnMut(&mut Ping, &mut World, &mut EventBus) -> EngineResult<()> + 'static {
        let log = log.clone();
        move |e, _, _| {
            log.borrow_mut().push(format!("{tag}{}", e.n));
            Ok(())
        }
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe(recorder(&log, "a"));
        bus.subscribe(recorder(&log, "b"));
        bus.publish(&mut world, ping(1));
        assert_eq!(*log.borrow(), vec!["a1", "b1"]);
    }

    #[test]
    fn handled_flag_stops_later_handlers() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe(|e: &mut Ping, _: &mut World, _: &mut EventBus| {
            e.set_handled();
            Ok(())
        });
        bus.subscribe(recorder(&log, "late"));
        bus.publish(&mut world, ping(1));
        assert!(log.borrow().is_empty());

        // Only the current event is affected.
        bus.subscribe(|_: &mut Pong, _: &mut World, _: &mut EventBus| Ok(()));
        bus.publish(&mut world, Pong::default());
        assert_eq!(bus.dispatch_count::<Pong>(), 1);
    }

    #[test]
    fn publish_inside_handler_is_queued() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let depth = Rc::new(RefCell::new((0u32, 0u32)));
        let d = depth.clone();
        bus.subscribe(move |e: &mut Ping, w: &mut World, b: &mut EventBus| {
            let mut guard = d.borrow_mut();
            guard.0 += 1;
            guard.1 = guard.1.max(guard.0);
            drop(guard);
            if e.n < 3 {
                b.publish(w, ping(e.n + 1));
            }
            d.borrow_mut().0 -= 1;
            Ok(())
        });

        bus.publish(&mut world, ping(1));
        assert_eq!(bus.queued_len(), 1);
        assert_eq!(bus.dispatch_count::<Ping>(), 1);

        bus.drain_queue(&mut world);
        assert_eq!(bus.queued_len(), 0);
        assert_eq!(bus.dispatch_count::<Ping>(), 3);
        assert_eq!(depth.borrow().1, 1);
    }

    #[test]
    fn queue_is_fifo_across_types() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe(recorder(&log, "p"));
        let l = log.clone();
        bus.subscribe(move |_: &mut Pong, _: &mut World, _: &mut EventBus| {
            l.borrow_mut().push("pong".into());
            Ok(())
        });

        bus.queue_event(ping(1));
        bus.queue_event(Pong::default());
        bus.queue_event(ping(2));
        assert!(log.borrow().is_empty());
        assert_eq!(
            bus.queued_names().collect::<Vec<_>>(),
            vec!["Ping", "Pong", "Ping"]
        );
        bus.drain_queue(&mut world);
        assert_eq!(*log.borrow(), vec!["p1", "pong", "p2"]);
    }

    #[test]
    fn failing_handlers_do_not_stop_dispatch() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe(|_: &mut Ping, _: &mut World, _: &mut EventBus| {
            Err(EngineError::Config("boom".into()))
        });
        bus.subscribe(|_: &mut Ping, _: &mut World, _: &mut EventBus| -> EngineResult<()> {
            panic!("handler exploded")
        });
        bus.subscribe(recorder(&log, "ok"));

        bus.queue_event(ping(7));
        bus.queue_event(ping(8));
        bus.drain_queue(&mut world);
        assert_eq!(*log.borrow(), vec!["ok7", "ok8"]);
        assert_eq!(bus.stats().handler_failures, 4);
        assert!(!bus.is_draining());
    }

    #[test]
    fn stale_entity_outcome_is_not_a_failure() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        bus.subscribe(|_: &mut Ping, w: &mut World, _: &mut EventBus| {
            w.get_component::<crate::components::transform::Transform>(crate::world::EntityId(99))?;
            Ok(())
        });
        bus.publish(&mut world, ping(1));
        assert_eq!(bus.stats().handler_failures, 0);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        let a = bus.subscribe(recorder(&log, "a"));
        bus.subscribe(recorder(&log, "b"));
        assert_eq!(bus.subscriber_count::<Ping>(), 2);
        assert!(bus.unsubscribe::<Ping>(a));
        assert!(!bus.unsubscribe::<Ping>(a));
        assert!(!bus.unsubscribe::<Pong>(a));
        bus.publish(&mut world, ping(1));
        assert_eq!(*log.borrow(), vec!["b1"]);
    }

    #[test]
    fn handler_can_unsubscribe_a_later_handler_mid_dispatch() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        let victim = Rc::new(RefCell::new(None::<HandlerId>));
        let v = victim.clone();
        bus.subscribe(move |_: &mut Ping, _: &mut World, b: &mut EventBus| {
            if let Some(id) = v.borrow_mut().take() {
                assert!(b.unsubscribe::<Ping>(id));
            }
            Ok(())
        });
        let id = bus.subscribe(recorder(&log, "victim"));
        *victim.borrow_mut() = Some(id);

        bus.publish(&mut world, ping(1));
        bus.publish(&mut world, ping(2));
        assert!(log.borrow().is_empty());
        assert_eq!(bus.subscriber_count::<Ping>(), 1);
    }

    #[test]
    fn subscribing_during_dispatch_appends_after_existing() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        let l = log.clone();
        let mut added = false;
        bus.subscribe(move |_: &mut Ping, _: &mut World, b: &mut EventBus| {
            if !added {
                added = true;
                b.subscribe(recorder(&l, "new"));
            }
            Ok(())
        });
        bus.subscribe(recorder(&log, "old"));

        bus.publish(&mut world, ping(1));
        assert_eq!(*log.borrow(), vec!["old1"]);
        bus.publish(&mut world, ping(2));
        assert_eq!(*log.borrow(), vec!["old1", "old2", "new2"]);
    }

    #[test]
    fn clear_drops_handlers_and_queue() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe(recorder(&log, "a"));
        bus.queue_event(ping(1));
        bus.publish(&mut world, Pong::default());
        assert_eq!(bus.stats().dispatched, 1);

        bus.clear();
        assert_eq!(bus.stats().dispatched, 0);
        assert_eq!(bus.stats().queued, 0);
        assert_eq!(bus.dispatch_count::<Pong>(), 0);
        bus.drain_queue(&mut world);
        bus.publish(&mut world, ping(2));
        assert!(log.borrow().is_empty());
        assert_eq!(bus.subscriber_count::<Ping>(), 0);
    }

    #[test]
    fn clear_from_a_handler_drops_the_running_handlers() {
        let mut world = World::new();
        let mut bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe(|_: &mut Ping, _: &mut World, bus: &mut EventBus| {
            bus.clear();
            Ok(())
        });
        bus.subscribe(recorder(&log, "late"));

        bus.publish(&mut world, ping(1));
        assert!(log.borrow().is_empty());
        assert_eq!(bus.subscriber_count::<Ping>(), 0);

        bus.publish(&mut world, ping(2));
        assert!(log.borrow().is_empty());
        assert_eq!(bus.stats().dispatched, 1);
    }
}
