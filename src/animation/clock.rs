//! Playback clock.
//!
//! [`resolve_playback_time`] is a pure mapping from an external, monotonically
//! increasing frame counter to an in-range animation frame. The counter itself
//! lives in an [`AnimationController`], which several bindings may share.

use crate::errors::{Result, SkelError};
use crate::settings::DEFAULT_FRAMES_PER_SECOND;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum LoopMode {
    /// Play to the end and hold the last frame.
    Once = 0,
    /// Wrap back to the start after the last frame.
    #[default]
    Repeat = 1,
}

impl TryFrom<u32> for LoopMode {
    type Error = SkelError;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Self::Once),
            1 => Ok(Self::Repeat),
            other => Err(SkelError::UnsupportedLoopMode(other)),
        }
    }
}

/// Maps `raw_frame` into `[0, duration]` under `loop_mode`.
///
/// `Once` clamps anything past `duration`. `Repeat` subtracts whole
/// durations while the frame is past the end, so an exact multiple of
/// `duration` lands on `duration` rather than `0`. Frames that are not past
/// the end are returned unchanged. A non-positive duration yields `0`.
#[must_use]
pub fn resolve_playback_time(duration: f32, loop_mode: LoopMode, raw_frame: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    if raw_frame <= duration {
        return raw_frame;
    }

    match loop_mode {
        LoopMode::Once => duration,
        LoopMode::Repeat => {
            let wrapped = raw_frame % duration;
            if wrapped == 0.0 { duration } else { wrapped }
        }
    }
}

/// External frame counter for one or more animation bindings.
///
/// Advances by `dt * frames_per_second * speed` on every [`update`](Self::update).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationController {
    frames_per_second: f32,
    speed: f32,
    time_in_frames: f32,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new(DEFAULT_FRAMES_PER_SECOND)
    }
}

impl AnimationController {
    #[must_use]
    pub fn new(frames_per_second: f32) -> Self {
        Self {
            frames_per_second,
            speed: 1.0,
            time_in_frames: 0.0,
        }
    }

    /// Core logic: advance time.
    pub fn update(&mut self, dt: f32) {
        let step = dt * self.frames_per_second * self.speed;
        // The counter never runs backwards
        if step > 0.0 {
            self.time_in_frames += step;
        }
    }

    #[inline]
    #[must_use]
    pub fn time_in_frames(&self) -> f32 {
        self.time_in_frames
    }

    /// Jumps to `frame`, e.g. to give a binding a phase offset.
    pub fn set_time_in_frames(&mut self, frame: f32) {
        self.time_in_frames = frame.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    #[inline]
    #[must_use]
    pub fn frames_per_second(&self) -> f32 {
        self.frames_per_second
    }
}
