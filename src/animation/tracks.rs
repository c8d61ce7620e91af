//! Keyframe tracks and the track sampler.
//!
//! A track is a time-sorted run of scalar keyframes with one interpolation
//! kind for the whole track. Sampling never extrapolates: linear tracks clamp
//! to their boundary keyframes, Hermite tracks wrap between their last and
//! first keyframe over the track-local loop length (`time_end`).

use crate::animation::values::{hermite, lerp, lerp_angle};
use crate::errors::{Result, SkelError};

/// Interval below which two keyframe times are considered coincident.
const MIN_KEYFRAME_SPAN: f32 = 1e-6;

/// Raw interpolation kind, as tagged in animation containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TrackKind {
    Linear = 0x01,
    Hermite = 0x02,
}

impl TryFrom<u32> for TrackKind {
    type Error = SkelError;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0x01 => Ok(Self::Linear),
            0x02 => Ok(Self::Hermite),
            other => Err(SkelError::UnknownTrackType(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearKeyframe {
    pub time: f32,
    pub value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HermiteKeyframe {
    pub time: f32,
    pub value: f32,
    pub tangent_in: f32,
    pub tangent_out: f32,
}

impl LinearKeyframe {
    #[must_use]
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

impl HermiteKeyframe {
    #[must_use]
    pub const fn new(time: f32, value: f32, tangent_in: f32, tangent_out: f32) -> Self {
        Self {
            time,
            value,
            tangent_in,
            tangent_out,
        }
    }
}

fn check_sorted(times: impl Iterator<Item = f32>) -> Result<()> {
    let mut previous: Option<f32> = None;
    for (index, time) in times.enumerate() {
        if previous.is_some_and(|prev| time <= prev) {
            return Err(SkelError::UnsortedKeyframes { index });
        }
        previous = Some(time);
    }
    if previous.is_none() {
        return Err(SkelError::EmptyTrack);
    }
    Ok(())
}

// ============================================================================
// Linear
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<LinearKeyframe>", into = "Vec<LinearKeyframe>")
)]
pub struct LinearTrack {
    frames: Vec<LinearKeyframe>,
}

impl LinearTrack {
    /// Builds a track from keyframes with strictly increasing times.
    pub fn new(frames: Vec<LinearKeyframe>) -> Result<Self> {
        check_sorted(frames.iter().map(|k| k.time))?;
        Ok(Self { frames })
    }

    #[inline]
    #[must_use]
    pub fn frames(&self) -> &[LinearKeyframe] {
        &self.frames
    }

    /// Locates the bracketing pair for `time`.
    ///
    /// Returns `Err(value)` when `time` falls outside the keyframe range (or
    /// the bracket is degenerate) and the boundary value applies.
    fn bracket(&self, time: f32) -> std::result::Result<(LinearKeyframe, LinearKeyframe, f32), f32> {
        let frames = &self.frames;
        // First keyframe strictly after `time`
        let idx1 = frames.partition_point(|k| k.time <= time);

        if idx1 == 0 {
            return Err(frames[0].value);
        }
        if idx1 == frames.len() {
            return Err(frames[frames.len() - 1].value);
        }

        let k0 = frames[idx1 - 1];
        let k1 = frames[idx1];
        let dt = k1.time - k0.time;
        if dt <= MIN_KEYFRAME_SPAN {
            return Err(k0.value);
        }

        let t = ((time - k0.time) / dt).clamp(0.0, 1.0);
        Ok((k0, k1, t))
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> f32 {
        match self.bracket(time) {
            Ok((k0, k1, t)) => lerp(k0.value, k1.value, t),
            Err(value) => value,
        }
    }

    /// Samples an angle channel (radians), blending along the shorter arc.
    #[must_use]
    pub fn sample_rotation(&self, time: f32) -> f32 {
        match self.bracket(time) {
            Ok((k0, k1, t)) => lerp_angle(k0.value, k1.value, t),
            Err(value) => value,
        }
    }
}

impl TryFrom<Vec<LinearKeyframe>> for LinearTrack {
    type Error = SkelError;

    fn try_from(frames: Vec<LinearKeyframe>) -> Result<Self> {
        Self::new(frames)
    }
}

impl From<LinearTrack> for Vec<LinearKeyframe> {
    fn from(track: LinearTrack) -> Self {
        track.frames
    }
}

// ============================================================================
// Hermite
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "HermiteTrackData", into = "HermiteTrackData")
)]
pub struct HermiteTrack {
    frames: Vec<HermiteKeyframe>,
    time_end: f32,
}

#[cfg(feature = "serde")]
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct HermiteTrackData {
    time_end: f32,
    frames: Vec<HermiteKeyframe>,
}

#[cfg(feature = "serde")]
impl TryFrom<HermiteTrackData> for HermiteTrack {
    type Error = SkelError;

    fn try_from(data: HermiteTrackData) -> Result<Self> {
        Self::new(data.frames, data.time_end)
    }
}

#[cfg(feature = "serde")]
impl From<HermiteTrack> for HermiteTrackData {
    fn from(track: HermiteTrack) -> Self {
        Self {
            time_end: track.time_end,
            frames: track.frames,
        }
    }
}

impl HermiteTrack {
    /// Builds a track from keyframes with strictly increasing times.
    ///
    /// `time_end` is the loop length used to bracket the gap between the last
    /// and first keyframe. A non-positive `time_end` disables wrapping and the
    /// track clamps like a linear one.
    pub fn new(frames: Vec<HermiteKeyframe>, time_end: f32) -> Result<Self> {
        check_sorted(frames.iter().map(|k| k.time))?;
        Ok(Self { frames, time_end })
    }

    #[inline]
    #[must_use]
    pub fn frames(&self) -> &[HermiteKeyframe] {
        &self.frames
    }

    #[inline]
    #[must_use]
    pub fn time_end(&self) -> f32 {
        self.time_end
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> f32 {
        let frames = &self.frames;
        let first = frames[0];
        let last = frames[frames.len() - 1];

        let idx1 = frames.partition_point(|k| k.time <= time);
        let wraps = idx1 == 0 || idx1 == frames.len();

        let (k0, k1, length, elapsed) = if wraps {
            if self.time_end <= 0.0 {
                return if idx1 == 0 { first.value } else { last.value };
            }
            let length = (first.time - last.time).rem_euclid(self.time_end);
            let elapsed = (time - last.time).rem_euclid(self.time_end);
            (last, first, length, elapsed)
        } else {
            let k0 = frames[idx1 - 1];
            let k1 = frames[idx1];
            (k0, k1, k1.time - k0.time, time - k0.time)
        };

        if length <= MIN_KEYFRAME_SPAN {
            // No gap to interpolate across; hold the nearest boundary
            return if idx1 == 0 { first.value } else { k0.value };
        }

        let t = (elapsed / length).clamp(0.0, 1.0);
        hermite(k0.value, k0.tangent_out, k1.tangent_in, k1.value, t, length)
    }
}

// ============================================================================
// AnimationTrack
// ============================================================================

/// A scalar animation channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "track", rename_all = "snake_case"))]
pub enum AnimationTrack {
    Linear(LinearTrack),
    Hermite(HermiteTrack),
}

impl AnimationTrack {
    pub fn linear(frames: Vec<LinearKeyframe>) -> Result<Self> {
        LinearTrack::new(frames).map(Self::Linear)
    }

    pub fn hermite(frames: Vec<HermiteKeyframe>, time_end: f32) -> Result<Self> {
        HermiteTrack::new(frames, time_end).map(Self::Hermite)
    }

    #[must_use]
    pub fn kind(&self) -> TrackKind {
        match self {
            Self::Linear(_) => TrackKind::Linear,
            Self::Hermite(_) => TrackKind::Hermite,
        }
    }

    /// Resolves the channel value at `time`.
    #[must_use]
    pub fn sample(&self, time: f32) -> f32 {
        match self {
            Self::Linear(track) => track.sample(time),
            Self::Hermite(track) => track.sample(time),
        }
    }

    /// Resolves an angle channel at `time`.
    ///
    /// Linear tracks interpolate along the shorter arc; Hermite tracks carry
    /// explicit tangents and are sampled as-is.
    #[must_use]
    pub fn sample_rotation(&self, time: f32) -> f32 {
        match self {
            Self::Linear(track) => track.sample_rotation(time),
            Self::Hermite(track) => track.sample(time),
        }
    }
}
