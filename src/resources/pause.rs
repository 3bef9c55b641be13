//! Global pause flag.
//!
//! Set and cleared by the pause/resume event handlers the input system
//! subscribes. While paused, gameplay input is ignored but UI input and the
//! pause key keep working.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PauseState {
    pub paused: bool,
}

impl PauseState {
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
