//! # skelgraph
//!
//! Run-time evaluation of hierarchical model skeletons.
//!
//! Given a static, pre-parsed model definition (node hierarchy, bind and
//! inverse-bind matrices, a node-tree bytecode tape) and a set of keyframe
//! animations, this crate computes per-slot world matrices, skinning
//! matrices and view-frustum visibility for a single frame.
//!
//! - [`animation`]: keyframe tracks, the playback clock, the bone animation
//!   binder and node-tree animator hooks.
//! - [`scene`]: model definitions, the bytecode interpreter, frustum
//!   classification and per-instance state.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use skelgraph::scene::{ModelInstance, Frustum};
//!
//! let mut instance = ModelInstance::new(Arc::clone(&model));
//! instance.advance(dt);
//! instance.prepare(&frustum)?;
//! for slot in 0..instance.state().len() {
//!     if instance.state().is_slot_visible(slot) {
//!         upload(instance.state().matrix(slot));
//!     }
//! }
//! ```

pub mod animation;
pub mod errors;
pub mod scene;
pub mod settings;

pub use animation::{
    AnimationController, AnimationTrack, Bone, LoopMode, SkeletalAnimation, TrackKind,
    compute_bone_matrix, resolve_playback_time,
};
pub use errors::{Result, SkelError};
pub use scene::{
    BoundingBox, Frustum, FrustumClassifier, InstanceState, IntersectionState, ModelDefinition,
    ModelInstance, ModelNode, NodeOverrides, NodeTreeOp, evaluate_instance,
};
pub use settings::EvaluationSettings;
