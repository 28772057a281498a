#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-sequence playback driven by elapsed time.

use std::time::Duration;

use log::{debug, trace};
use thiserror::Error;
use weapon_factory_core::{AnimationDefinition, TimedTask};

/// Reasons an animation definition cannot be played.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AnimationError {
    /// The definition carries no frames.
    #[error("animation `{name}` has no frames")]
    NoFrames {
        /// Name of the rejected animation.
        name: String,
    },
    /// A frame would never advance.
    #[error("frame {index} of animation `{name}` has zero duration")]
    ZeroDuration {
        /// Name of the rejected animation.
        name: String,
        /// Zero-based index of the offending frame.
        index: usize,
    },
}

#[derive(Clone, Debug)]
struct Frame {
    id: String,
    duration: Duration,
}

/// Cursor over an ordered list of frames.
///
/// Surplus time carries into the following frames within a single call, so a
/// long stall fast-forwards through every frame it covers. A non-looping
/// animation that runs past its last frame becomes done and discards whatever
/// time was left.
#[derive(Clone, Debug)]
pub struct AnimationState {
    name: String,
    frames: Vec<Frame>,
    looped: bool,
    index: usize,
    remaining: Duration,
    done: bool,
}

impl AnimationState {
    /// Validates the definition and positions the cursor on its first frame.
    pub fn new(definition: &AnimationDefinition) -> Result<Self, AnimationError> {
        if definition.frames.is_empty() {
            return Err(AnimationError::NoFrames {
                name: definition.name.clone(),
            });
        }
        if let Some(index) = definition
            .frames
            .iter()
            .position(|frame| frame.duration_ms == 0)
        {
            return Err(AnimationError::ZeroDuration {
                name: definition.name.clone(),
                index,
            });
        }

        let frames: Vec<Frame> = definition
            .frames
            .iter()
            .map(|spec| Frame {
                id: spec.frame.clone(),
                duration: Duration::from_millis(spec.duration_ms),
            })
            .collect();
        let remaining = frames[0].duration;

        Ok(Self {
            name: definition.name.clone(),
            frames,
            looped: definition.looped,
            index: 0,
            remaining,
            done: false,
        })
    }

    /// Name taken from the definition.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the frame the render collaborator should draw.
    #[must_use]
    pub fn frame(&self) -> &str {
        &self.frames[self.index].id
    }

    /// Zero-based index of the current frame.
    #[must_use]
    pub const fn frame_index(&self) -> usize {
        self.index
    }

    /// Number of frames in the animation.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Time left on the current frame; zero once done.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whether the animation rewinds after its last frame.
    #[must_use]
    pub const fn is_looped(&self) -> bool {
        self.looped
    }

    /// Sum of every frame duration.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.frames.iter().map(|frame| frame.duration).sum()
    }

    /// Puts the cursor back on the first frame with its full duration.
    pub fn rewind(&mut self) {
        self.index = 0;
        self.remaining = self.frames[0].duration;
        self.done = false;
    }

    fn next_frame(&mut self) {
        if self.index + 1 < self.frames.len() {
            self.index += 1;
            self.remaining = self.frames[self.index].duration;
        } else if self.looped {
            trace!("animation `{}` looped", self.name);
            self.rewind();
        } else {
            debug!("animation `{}` finished", self.name);
            self.remaining = Duration::ZERO;
            self.done = true;
        }
    }
}

impl TimedTask for AnimationState {
    fn add_time(&mut self, elapsed: Duration) {
        assert!(
            !self.done,
            "time added to finished animation `{}`",
            self.name
        );

        let mut left = elapsed;
        while !left.is_zero() && !self.done {
            if left < self.remaining {
                self.remaining -= left;
                left = Duration::ZERO;
            } else {
                left -= self.remaining;
                self.next_frame();
            }
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
