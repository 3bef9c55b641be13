//! Event types exchanged between systems.
//!
//! All events travel through the [`bus::EventBus`]. Systems publish what
//! happened and subscribe to what they react to, so no system needs to know
//! about another.
//!
//! Submodules:
//! - [`bus`] – the publish/subscribe bus and the [`bus::GameEvent`] trait
//! - [`animation`] – clip started / looped / completed notifications
//! - [`collision`] – collision, trigger and movement notifications from physics
//! - [`entity`] – entity spawn and destroy notifications
//! - [`gameplay`] – health, death and item pickup
//! - [`gamestate`] – pause/resume and scene switches
//! - [`input`] – movement intents, action presses and raw key/button/touch edges
//! - [`ui`] – clickable button presses

/// Implements [`bus::GameEvent`] for structs carrying a `header` field.
macro_rules! game_event {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::events::bus::GameEvent for $ty {
                fn header(&self) -> &$crate::events::bus::EventHeader {
                    &self.header
                }
                fn header_mut(&mut self) -> &mut $crate::events::bus::EventHeader {
                    &mut self.header
                }
            }
        )+
    };
}

pub mod animation;
pub mod bus;
pub mod collision;
pub mod entity;
pub mod gameplay;
pub mod gamestate;
pub mod input;
pub mod ui;
