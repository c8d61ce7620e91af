//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`SkelError`] covers data-integrity failures only:
//! - Unknown raw tags (track type, loop mode) coming from a parser
//! - Malformed keyframe tracks
//! - Bytecode tape references to missing nodes or unresolved matrix slots
//! - Bone lookup tables pointing at missing animation nodes
//!
//! Missing optional bindings are never errors; they fall back to bind-pose
//! data.
//!
//! # Usage
//!
//! ```rust,ignore
//! use skelgraph::errors::Result;
//!
//! fn load(model: &ModelDefinition) -> Result<()> {
//!     model.validate()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for skeleton evaluation.
///
/// Every variant describes corrupt or unsupported static data. Evaluation
/// stops at the first one; retrying with the same inputs fails the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkelError {
    // ========================================================================
    // Animation Data Errors
    // ========================================================================
    /// Raw track type tag is not a known interpolation kind.
    #[error("Unknown animation track type: {0:#04x}")]
    UnknownTrackType(u32),

    /// Raw loop mode tag is not a known playback policy.
    #[error("Unsupported loop mode: {0}")]
    UnsupportedLoopMode(u32),

    /// A keyframe track was constructed without keyframes.
    #[error("Animation track has no keyframes")]
    EmptyTrack,

    /// Keyframe times must be strictly increasing.
    #[error("Keyframe {index} is not after its predecessor")]
    UnsortedKeyframes {
        /// Index of the first out-of-order keyframe
        index: usize,
    },

    /// A bone with a bound animation node was sampled without a frame.
    #[error("Bone {bone_id} is animated but no animation frame was supplied")]
    MissingAnimationClock {
        /// Id of the bone being computed
        bone_id: usize,
    },

    /// The bone → animation-node table points past the node list.
    #[error("Animation node {index} does not exist (len {len})")]
    AnimationNodeOutOfRange {
        /// The invalid animation node index
        index: usize,
        /// Number of animation nodes
        len: usize,
    },

    /// More animation nodes than a signed 16-bit bone table can address.
    #[error("Animation has {node_count} nodes; the bone table addresses at most 32767")]
    BoneTableOverflow {
        /// Number of animation nodes
        node_count: usize,
    },

    // ========================================================================
    // Node-Tree Bytecode Errors
    // ========================================================================
    /// A tape instruction addresses a slot beyond the matrix table.
    #[error("Op {op_index}: matrix slot {slot} out of range (len {len})")]
    SlotOutOfRange {
        /// Position of the instruction in the tape
        op_index: usize,
        /// The invalid slot
        slot: usize,
        /// Declared world-matrix count
        len: usize,
    },

    /// A tape instruction reads a slot nothing has written yet.
    #[error("Op {op_index}: matrix slot {slot} read before it was resolved")]
    UnresolvedSlot {
        /// Position of the instruction in the tape
        op_index: usize,
        /// The unresolved slot
        slot: usize,
    },

    /// A tape instruction references a node the model does not have.
    #[error("Op {op_index}: node {node_id} out of range (len {len})")]
    NodeOutOfRange {
        /// Position of the instruction in the tape
        op_index: usize,
        /// The invalid node id
        node_id: usize,
        /// Number of nodes in the model
        len: usize,
    },
}

/// Alias for `Result<T, SkelError>`.
pub type Result<T> = std::result::Result<T, SkelError>;
