pub mod clock;
pub mod node_tree;
pub mod skeletal;
pub mod tracks;
pub mod values;

pub use clock::{AnimationController, LoopMode, resolve_playback_time};
pub use node_tree::{
    NodeMatrixAnimator, NodeVisibilityAnimation, NodeVisibilityAnimator, SkeletalNodeAnimator,
    VisibilityTrack,
};
pub use skeletal::{
    AnimationNode, Bone, Channel, NO_ANIMATION_NODE, SkeletalAnimation, compose_srt,
    compute_bone_matrix,
};
pub use tracks::{AnimationTrack, HermiteKeyframe, HermiteTrack, LinearKeyframe, LinearTrack, TrackKind};
