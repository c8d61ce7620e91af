//! Evaluation Settings
//!
//! Knobs that change how a [`ModelInstance`](crate::scene::ModelInstance)
//! turns wall-clock time into animation frames and how much culling work the
//! node-tree interpreter performs.
//!
//! ```rust,ignore
//! use skelgraph::EvaluationSettings;
//!
//! let settings = EvaluationSettings {
//!     frames_per_second: 60.0,
//!     ..Default::default()
//! };
//! ```

/// Default animation rate, in frames per second.
pub const DEFAULT_FRAMES_PER_SECOND: f32 = 30.0;

/// Configuration for per-frame skeleton evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvaluationSettings {
    /// Rate at which animation controllers convert seconds into frames.
    pub frames_per_second: f32,

    /// Run the frustum test on every placed node with a bounding volume.
    ///
    /// When disabled, nodes below a visible parent are treated as fully
    /// inside. Nodes below a fully-outside parent stay fully outside either
    /// way.
    pub node_culling: bool,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
            node_culling: true,
        }
    }
}
