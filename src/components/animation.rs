//! Animation clips and per-entity playback state.
//!
//! An [`Animation`] maps a closed set of [`AnimationAction`]s to
//! [`AnimationClip`]s and tracks which one is playing. The component only
//! knows how to step its own counters; the
//! [`AnimationSystem`](crate::systems::animation::AnimationSystem) turns
//! those steps into sprite updates and lifecycle events.
//!
//! # Timing
//!
//! Each frame of a clip is shown for `frame_delay` seconds. The first update
//! after a clip (re)starts only marks the clip as shown; time accumulates from
//! the update after that. A 4-frame looping clip at 0.1s per frame driven by
//! five 0.1s updates therefore ends back on frame 0 having looped once.

use std::sync::Arc;

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::sprite::TextureRegion;
use super::{ComponentKind, EngineComponent};

/// Named animation states.
///
/// Only right-facing and up-facing source clips exist; left and down are
/// produced by flipping the sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationAction {
    IdleRight,
    IdleUp,
    RunRight,
    RunUp,
    JumpRight,
    JumpUp,
    Emote,
    Ability1,
    Ability2,
    Ability3,
    Death,
    Despawn,
    Hit,
    Loot,
}

impl AnimationAction {
    /// States a movement intent must not interrupt while they play.
    pub fn is_committed(self) -> bool {
        matches!(
            self,
            AnimationAction::Death
                | AnimationAction::Despawn
                | AnimationAction::Hit
                | AnimationAction::Loot
        )
    }

    /// States a movement intent must never interrupt, even once finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, AnimationAction::Death | AnimationAction::Despawn)
    }

    /// Whether this action belongs to the up-facing family.
    pub fn is_vertical(self) -> bool {
        matches!(
            self,
            AnimationAction::IdleUp | AnimationAction::RunUp | AnimationAction::JumpUp
        )
    }
}

/// An ordered sequence of texture regions with a per-frame delay.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub frames: Arc<[TextureRegion]>,
    /// Seconds each frame stays on screen.
    pub frame_delay: f32,
    pub looping: bool,
}

impl AnimationClip {
    pub fn new(frames: impl Into<Arc<[TextureRegion]>>, frame_delay: f32, looping: bool) -> Self {
        Self {
            frames: frames.into(),
            frame_delay,
            looping,
        }
    }

    /// Cut `count` equally sized frames from a horizontal sprite-sheet strip
    /// starting at `first`.
    pub fn from_strip(first: TextureRegion, count: usize, frame_delay: f32, looping: bool) -> Self {
        let frames: Vec<TextureRegion> = (0..count)
            .map(|i| TextureRegion {
                x: first.x + i as f32 * first.width,
                ..first
            })
            .collect();
        Self::new(frames, frame_delay, looping)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Outcome of one [`Animation::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStep {
    /// Nothing visible changed.
    Held,
    /// Moved to the next frame.
    Advanced,
    /// Wrapped back to frame 0; carries the new loop count.
    Looped(u32),
    /// Reached the end of a non-looping clip and stopped.
    Completed,
}

/// Per-entity animation playback state.
#[derive(Debug, Clone, Component)]
pub struct Animation {
    pub clips: FxHashMap<AnimationAction, AnimationClip>,
    /// Always a key of `clips`.
    pub current: AnimationAction,
    pub frame_index: usize,
    /// Seconds spent on the current frame.
    pub elapsed: f32,
    pub playing: bool,
    pub looping: bool,
    /// Incremented every time a looping clip wraps.
    pub loop_count: u32,
    fresh: bool,
}

impl Animation {
    /// Create with `initial` as the active, playing clip.
    pub fn new(initial: AnimationAction, clip: AnimationClip) -> Self {
        let looping = clip.looping;
        let mut clips = FxHashMap::default();
        clips.insert(initial, clip);
        Self {
            clips,
            current: initial,
            frame_index: 0,
            elapsed: 0.0,
            playing: true,
            looping,
            loop_count: 0,
            fresh: true,
        }
    }

    pub fn with_clip(mut self, action: AnimationAction, clip: AnimationClip) -> Self {
        self.insert_clip(action, clip);
        self
    }

    /// Adds or replaces a clip. Replacing the active clip restarts it.
    pub fn insert_clip(&mut self, action: AnimationAction, clip: AnimationClip) {
        self.clips.insert(action, clip);
        if action == self.current {
            self.restart(action);
        }
    }

    pub fn has_clip(&self, action: AnimationAction) -> bool {
        self.clips.contains_key(&action)
    }

    pub fn clip(&self) -> Option<&AnimationClip> {
        self.clips.get(&self.current)
    }

    /// Texture region of the frame currently shown.
    pub fn current_region(&self) -> Option<TextureRegion> {
        self.clip()
            .and_then(|clip| clip.frames.get(self.frame_index))
            .copied()
    }

    /// Switch to `action` from frame 0 and start playing.
    /// Returns `false` (and changes nothing) if there is no such clip.
    pub fn restart(&mut self, action: AnimationAction) -> bool {
        let Some(clip) = self.clips.get(&action) else {
            return false;
        };
        self.looping = clip.looping;
        self.current = action;
        self.frame_index = 0;
        self.elapsed = 0.0;
        self.loop_count = 0;
        self.playing = true;
        self.fresh = true;
        true
    }

    /// Whether a movement intent may replace the current state.
    pub fn accepts_movement(&self) -> bool {
        if self.current.is_terminal() {
            return false;
        }
        !(self.current.is_committed() && self.playing)
    }

    /// Step playback by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> AnimationStep {
        if !self.playing {
            return AnimationStep::Held;
        }
        if self.fresh {
            self.fresh = false;
            return AnimationStep::Held;
        }
        let Some((delay, count)) = self.clip().map(|c| (c.frame_delay, c.frame_count())) else {
            return AnimationStep::Held;
        };
        if count == 0 {
            return AnimationStep::Held;
        }

        self.elapsed += dt;
        if self.elapsed < delay {
            return AnimationStep::Held;
        }
        self.elapsed = 0.0;
        self.frame_index += 1;

        if self.frame_index < count {
            return AnimationStep::Advanced;
        }
        if self.looping {
            self.frame_index = 0;
            self.loop_count += 1;
            AnimationStep::Looped(self.loop_count)
        } else {
            self.frame_index = count - 1;
            self.playing = false;
            AnimationStep::Completed
        }
    }

    /// Stop and rewind to frame 0.
    pub fn stop(&mut self) {
        self.playing = false;
        self.frame_index = 0;
        self.elapsed = 0.0;
    }

    /// Stop without rewinding.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Continue from the current frame.
    pub fn resume(&mut self) {
        self.playing = true;
    }
}

impl EngineComponent for Animation {
    const KIND: ComponentKind = ComponentKind::Animation;
}
