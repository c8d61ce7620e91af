//! Bone animation binder.
//!
//! A [`SkeletalAnimation`] maps skeleton bones onto animation nodes through a
//! signed lookup table. Each node may animate any subset of the nine
//! scale/rotation/translation channels; the rest keep the bone's bind pose.

use glam::{Mat4, Vec3};

use crate::animation::clock::{LoopMode, resolve_playback_time};
use crate::animation::tracks::AnimationTrack;
use crate::errors::{Result, SkelError};

/// Table entry meaning "this bone is not animated".
pub const NO_ANIMATION_NODE: i16 = -1;

/// One of the nine independently animatable bone channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    ScaleX,
    ScaleY,
    ScaleZ,
    RotationX,
    RotationY,
    RotationZ,
    TranslationX,
    TranslationY,
    TranslationZ,
}

impl Channel {
    pub const COUNT: usize = 9;

    pub const ALL: [Channel; Self::COUNT] = [
        Channel::ScaleX,
        Channel::ScaleY,
        Channel::ScaleZ,
        Channel::RotationX,
        Channel::RotationY,
        Channel::RotationZ,
        Channel::TranslationX,
        Channel::TranslationY,
        Channel::TranslationZ,
    ];

    #[inline]
    #[must_use]
    pub fn is_rotation(self) -> bool {
        matches!(
            self,
            Channel::RotationX | Channel::RotationY | Channel::RotationZ
        )
    }
}

/// Static bind-pose transform of a skeleton bone.
///
/// Rotation is Euler angles in radians, applied X then Y then Z.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bone {
    pub id: usize,
    pub scale: Vec3,
    pub rotation: Vec3,
    pub translation: Vec3,
}

impl Bone {
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
        }
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Bind-pose value of a single channel.
    #[must_use]
    pub fn channel(&self, channel: Channel) -> f32 {
        match channel {
            Channel::ScaleX => self.scale.x,
            Channel::ScaleY => self.scale.y,
            Channel::ScaleZ => self.scale.z,
            Channel::RotationX => self.rotation.x,
            Channel::RotationY => self.rotation.y,
            Channel::RotationZ => self.rotation.z,
            Channel::TranslationX => self.translation.x,
            Channel::TranslationY => self.translation.y,
            Channel::TranslationZ => self.translation.z,
        }
    }

    #[must_use]
    pub fn bind_matrix(&self) -> Mat4 {
        compose_srt(self.scale, self.rotation, self.translation)
    }
}

/// Composes scale, Euler rotation and translation into one matrix.
///
/// Order is fixed: scale, rotate X, rotate Y, rotate Z, translate
/// (`T * Rz * Ry * Rx * S`). Authoring tools bake data against this order.
#[must_use]
pub fn compose_srt(scale: Vec3, rotation: Vec3, translation: Vec3) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_rotation_z(rotation.z)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_x(rotation.x)
        * Mat4::from_scale(scale)
}

/// Per-bone channel tracks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationNode {
    pub bone_index: usize,
    tracks: [Option<AnimationTrack>; Channel::COUNT],
}

impl AnimationNode {
    #[must_use]
    pub fn new(bone_index: usize) -> Self {
        Self {
            bone_index,
            tracks: Default::default(),
        }
    }

    #[must_use]
    pub fn with_track(mut self, channel: Channel, track: AnimationTrack) -> Self {
        self.set_track(channel, Some(track));
        self
    }

    pub fn set_track(&mut self, channel: Channel, track: Option<AnimationTrack>) {
        self.tracks[channel as usize] = track;
    }

    #[inline]
    #[must_use]
    pub fn track(&self, channel: Channel) -> Option<&AnimationTrack> {
        self.tracks[channel as usize].as_ref()
    }

    /// Resolves one channel at an already clock-resolved frame, falling back
    /// to `bind_value` when the node has no track for it.
    #[must_use]
    pub fn sample_channel(&self, channel: Channel, frame: f32, bind_value: f32) -> f32 {
        match self.track(channel) {
            Some(track) if channel.is_rotation() => track.sample_rotation(frame),
            Some(track) => track.sample(frame),
            None => bind_value,
        }
    }
}

/// A parsed skeletal animation asset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "SkeletalAnimationData", into = "SkeletalAnimationData")
)]
pub struct SkeletalAnimation {
    duration: f32,
    loop_mode: LoopMode,
    bone_to_node: Vec<i16>,
    nodes: Vec<AnimationNode>,
}

#[cfg(feature = "serde")]
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct SkeletalAnimationData {
    duration: f32,
    #[serde(default)]
    loop_mode: LoopMode,
    bone_to_node: Vec<i16>,
    nodes: Vec<AnimationNode>,
}

#[cfg(feature = "serde")]
impl TryFrom<SkeletalAnimationData> for SkeletalAnimation {
    type Error = SkelError;

    fn try_from(data: SkeletalAnimationData) -> Result<Self> {
        Self::new(data.duration, data.loop_mode, data.bone_to_node, data.nodes)
    }
}

#[cfg(feature = "serde")]
impl From<SkeletalAnimation> for SkeletalAnimationData {
    fn from(anim: SkeletalAnimation) -> Self {
        Self {
            duration: anim.duration,
            loop_mode: anim.loop_mode,
            bone_to_node: anim.bone_to_node,
            nodes: anim.nodes,
        }
    }
}

impl SkeletalAnimation {
    /// Builds an animation, checking every non-negative table entry.
    pub fn new(
        duration: f32,
        loop_mode: LoopMode,
        bone_to_node: Vec<i16>,
        nodes: Vec<AnimationNode>,
    ) -> Result<Self> {
        for &entry in &bone_to_node {
            if let Ok(index) = usize::try_from(entry) {
                if index >= nodes.len() {
                    return Err(SkelError::AnimationNodeOutOfRange {
                        index,
                        len: nodes.len(),
                    });
                }
            }
        }

        Ok(Self {
            duration,
            loop_mode,
            bone_to_node,
            nodes,
        })
    }

    /// Builds the bone table from each node's `bone_index`.
    ///
    /// Later nodes win when two target the same bone.
    pub fn from_nodes(
        duration: f32,
        loop_mode: LoopMode,
        bone_count: usize,
        nodes: Vec<AnimationNode>,
    ) -> Result<Self> {
        let mut bone_to_node = vec![NO_ANIMATION_NODE; bone_count];
        for (index, node) in nodes.iter().enumerate() {
            let Some(entry) = bone_to_node.get_mut(node.bone_index) else {
                log::warn!(
                    "Animation node {index} targets bone {} outside a {bone_count}-bone skeleton",
                    node.bone_index
                );
                continue;
            };
            *entry = i16::try_from(index).map_err(|_| SkelError::BoneTableOverflow {
                node_count: nodes.len(),
            })?;
        }
        Self::new(duration, loop_mode, bone_to_node, nodes)
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, loop_mode: LoopMode) {
        self.loop_mode = loop_mode;
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[AnimationNode] {
        &self.nodes
    }

    /// Animation node bound to `bone_id`, if any.
    ///
    /// Bones past the end of the table count as unanimated.
    #[must_use]
    pub fn node_for_bone(&self, bone_id: usize) -> Option<&AnimationNode> {
        let entry = *self.bone_to_node.get(bone_id)?;
        let index = usize::try_from(entry).ok()?;
        self.nodes.get(index)
    }

    /// Maps an external frame counter into this animation's range.
    #[inline]
    #[must_use]
    pub fn resolve_frame(&self, raw_frame: f32) -> f32 {
        resolve_playback_time(self.duration, self.loop_mode, raw_frame)
    }
}

/// Computes the local SRT matrix of `bone` into `dst`.
///
/// Without an animation, or when the bone has no animation node, the bone's
/// bind pose is used verbatim. Otherwise each of the nine channels is sampled
/// at the clock-resolved `frame` if the node has a track for it.
pub fn compute_bone_matrix(
    dst: &mut Mat4,
    bone: &Bone,
    animation: Option<&SkeletalAnimation>,
    frame: Option<f32>,
) -> Result<()> {
    let node = animation.and_then(|anim| anim.node_for_bone(bone.id).map(|node| (anim, node)));

    let Some((anim, node)) = node else {
        *dst = bone.bind_matrix();
        return Ok(());
    };

    let raw_frame = frame.ok_or(SkelError::MissingAnimationClock { bone_id: bone.id })?;
    let anim_frame = anim.resolve_frame(raw_frame);

    let mut values = [0.0_f32; Channel::COUNT];
    for channel in Channel::ALL {
        values[channel as usize] = node.sample_channel(channel, anim_frame, bone.channel(channel));
    }

    let [sx, sy, sz, rx, ry, rz, tx, ty, tz] = values;
    *dst = compose_srt(
        Vec3::new(sx, sy, sz),
        Vec3::new(rx, ry, rz),
        Vec3::new(tx, ty, tz),
    );
    Ok(())
}
