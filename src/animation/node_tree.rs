//! Node-tree animator hooks.
//!
//! The bytecode interpreter asks these providers for a node's local matrix and
//! visibility before falling back to the model's bind-pose data. A provider
//! answering `None` for a node leaves that node on its static data.

use std::fmt::Debug;
use std::sync::Arc;

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::animation::clock::{LoopMode, resolve_playback_time};
use crate::animation::skeletal::{Bone, SkeletalAnimation, compute_bone_matrix};

/// Supplies animated local matrices for scene-graph nodes.
pub trait NodeMatrixAnimator: Debug + Send + Sync {
    /// Local (parent-relative) matrix of `node_id` at the raw `frame`, or
    /// `None` when this animator does not drive the node.
    fn calc_model_matrix(&self, node_id: usize, frame: f32) -> Option<Mat4>;
}

/// Supplies animated visibility bits for scene-graph nodes.
pub trait NodeVisibilityAnimator: Debug + Send + Sync {
    fn calc_visibility(&self, node_id: usize, frame: f32) -> Option<bool>;
}

// ============================================================================
// Skeletal animation → node matrices
// ============================================================================

/// Drives node matrices from a [`SkeletalAnimation`], treating bone ids as
/// node ids.
#[derive(Debug, Clone)]
pub struct SkeletalNodeAnimator {
    animation: Arc<SkeletalAnimation>,
    bones: FxHashMap<usize, Bone>,
}

impl SkeletalNodeAnimator {
    #[must_use]
    pub fn new(animation: Arc<SkeletalAnimation>, bones: &[Bone]) -> Self {
        let bones = bones.iter().map(|bone| (bone.id, *bone)).collect();
        Self { animation, bones }
    }

    #[inline]
    #[must_use]
    pub fn animation(&self) -> &Arc<SkeletalAnimation> {
        &self.animation
    }
}

impl NodeMatrixAnimator for SkeletalNodeAnimator {
    fn calc_model_matrix(&self, node_id: usize, frame: f32) -> Option<Mat4> {
        let bone = self.bones.get(&node_id)?;
        self.animation.node_for_bone(node_id)?;

        let mut matrix = Mat4::IDENTITY;
        compute_bone_matrix(&mut matrix, bone, Some(&self.animation), Some(frame)).ok()?;
        Some(matrix)
    }
}

// ============================================================================
// Keyframed visibility
// ============================================================================

/// Visibility of one node over time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VisibilityTrack {
    Constant(bool),
    /// One bit per whole frame, starting at frame 0.
    Frames(Vec<bool>),
}

impl VisibilityTrack {
    /// Bit at `frame`; frames past the end hold the last bit.
    #[must_use]
    pub fn sample(&self, frame: f32) -> bool {
        match self {
            Self::Constant(visible) => *visible,
            Self::Frames(bits) => {
                let Some(&last) = bits.last() else {
                    return true;
                };
                let index = frame.max(0.0).floor() as usize;
                bits.get(index).copied().unwrap_or(last)
            }
        }
    }
}

/// Keyframed per-node visibility.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeVisibilityAnimation {
    pub duration: f32,
    pub loop_mode: LoopMode,
    pub tracks: FxHashMap<usize, VisibilityTrack>,
}

impl NodeVisibilityAnimation {
    #[must_use]
    pub fn new(duration: f32, loop_mode: LoopMode) -> Self {
        Self {
            duration,
            loop_mode,
            tracks: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_track(mut self, node_id: usize, track: VisibilityTrack) -> Self {
        self.tracks.insert(node_id, track);
        self
    }
}

impl NodeVisibilityAnimator for NodeVisibilityAnimation {
    fn calc_visibility(&self, node_id: usize, frame: f32) -> Option<bool> {
        let track = self.tracks.get(&node_id)?;
        let anim_frame = resolve_playback_time(self.duration, self.loop_mode, frame);
        Some(track.sample(anim_frame))
    }
}
