use bevy_ecs::prelude::Resource;

/// Simulation clock, advanced once per scene frame.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct WorldTime {
    /// Seconds simulated since the scene started (scaled).
    pub elapsed: f32,
    /// Scaled delta of the current frame.
    pub delta: f32,
    pub time_scale: f32,
    pub frame: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame: 0,
        }
    }
}

impl WorldTime {
    /// Record a new frame of `raw_delta` seconds and return the scaled delta.
    pub fn tick(&mut self, raw_delta: f32) -> f32 {
        self.delta = raw_delta.max(0.0) * self.time_scale;
        self.elapsed += self.delta;
        self.frame += 1;
        self.delta
    }
}
