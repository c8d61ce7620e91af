//! Scene-graph bytecode interpreter.
//!
//! One linear pass over [`ModelDefinition::ops`] fills the instance's flat
//! matrix and visibility tables. Slot 0 must be seeded (see
//! [`InstanceState::seed_root`]) before the pass; every other slot is written
//! by the tape before it is read.
//!
//! Culling is top-down and conservative: a `FullyOutside` parent prunes its
//! whole branch, a `FullyInside` parent skips the per-node test, and only a
//! partially visible parent asks the [`FrustumClassifier`] about the child.

use glam::Mat4;

use crate::animation::node_tree::{NodeMatrixAnimator, NodeVisibilityAnimator};
use crate::errors::Result;
use crate::scene::frustum::{FrustumClassifier, IntersectionState};
use crate::scene::instance::InstanceState;
use crate::scene::model::{BlendSource, ModelDefinition, NodeTreeOp};
use crate::settings::EvaluationSettings;

/// Animator overrides consulted by `PlaceNode`, each paired with the raw
/// frame it should be sampled at.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeOverrides<'a> {
    pub matrix: Option<(&'a dyn NodeMatrixAnimator, f32)>,
    pub visibility: Option<(&'a dyn NodeVisibilityAnimator, f32)>,
}

impl<'a> NodeOverrides<'a> {
    /// No overrides: every node uses its bind pose and static visibility.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_matrix(mut self, animator: &'a dyn NodeMatrixAnimator, frame: f32) -> Self {
        self.matrix = Some((animator, frame));
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, animator: &'a dyn NodeVisibilityAnimator, frame: f32) -> Self {
        self.visibility = Some((animator, frame));
        self
    }

    fn local_matrix(&self, node_id: usize) -> Option<Mat4> {
        let (animator, frame) = self.matrix?;
        animator.calc_model_matrix(node_id, frame)
    }

    fn node_visibility(&self, node_id: usize) -> Option<bool> {
        let (animator, frame) = self.visibility?;
        animator.calc_visibility(node_id, frame)
    }
}

/// Runs the model's tape against `state` with default settings.
///
/// The root slot must already hold the instance's model matrix and root
/// classification.
pub fn evaluate_instance(
    model: &ModelDefinition,
    state: &mut InstanceState,
    overrides: &NodeOverrides<'_>,
    classifier: &impl FrustumClassifier,
) -> Result<()> {
    evaluate_instance_with_settings(
        model,
        state,
        overrides,
        classifier,
        &EvaluationSettings::default(),
    )
}

/// Runs the model's tape against `state`.
///
/// Stops at the first instruction that references a missing node or an
/// unwritten slot; slots written before it keep their values.
pub fn evaluate_instance_with_settings(
    model: &ModelDefinition,
    state: &mut InstanceState,
    overrides: &NodeOverrides<'_>,
    classifier: &impl FrustumClassifier,
    settings: &EvaluationSettings,
) -> Result<()> {
    state.begin_pass(model);
    refresh_node_visibility(model, state, overrides);

    for (op_index, op) in model.ops.iter().enumerate() {
        match op {
            NodeTreeOp::PlaceNode {
                node_id,
                parent_slot,
                dest_slot,
            } => place_node(
                model,
                state,
                overrides,
                classifier,
                settings,
                op_index,
                *node_id,
                *parent_slot,
                *dest_slot,
            )?,
            NodeTreeOp::DuplicateMatrix {
                src_slot,
                dest_slot,
            } => duplicate_matrix(state, op_index, *src_slot, *dest_slot)?,
            NodeTreeOp::MixMatrices { dest_slot, sources } => {
                mix_matrices(state, op_index, *dest_slot, sources)?;
            }
            NodeTreeOp::ApplyInverseBind { node_id, slot } => {
                apply_inverse_bind(model, state, op_index, *node_id, *slot)?;
            }
        }
    }

    Ok(())
}

/// Per-node visibility bits do not depend on the tape: every node answers
/// from the animator, falling back to its static flag.
fn refresh_node_visibility(
    model: &ModelDefinition,
    state: &mut InstanceState,
    overrides: &NodeOverrides<'_>,
) {
    for (node_id, (node, visible)) in model.nodes.iter().zip(&mut state.node_visible).enumerate() {
        *visible = overrides.node_visibility(node_id).unwrap_or(node.visible);
    }
}

#[allow(clippy::too_many_arguments)]
fn place_node(
    model: &ModelDefinition,
    state: &mut InstanceState,
    overrides: &NodeOverrides<'_>,
    classifier: &impl FrustumClassifier,
    settings: &EvaluationSettings,
    op_index: usize,
    node_id: usize,
    parent_slot: usize,
    dest_slot: usize,
) -> Result<()> {
    let node = model.node(op_index, node_id)?;
    state.slots.check_read(op_index, parent_slot)?;
    state.slots.check_write(op_index, dest_slot)?;

    let local = overrides
        .local_matrix(node_id)
        .unwrap_or(node.bind_matrix);
    let world = state.matrices[parent_slot] * local;

    let visibility = match (state.visibility[parent_slot], &node.bbox) {
        (IntersectionState::FullyOutside, _) => IntersectionState::FullyOutside,
        (IntersectionState::FullyInside, _) | (_, None) => IntersectionState::FullyInside,
        (IntersectionState::PartialIntersect, Some(_)) if !settings.node_culling => {
            IntersectionState::FullyInside
        }
        (IntersectionState::PartialIntersect, Some(bbox)) => classifier.classify(bbox, &world),
    };

    state.matrices[dest_slot] = world;
    state.visibility[dest_slot] = visibility;
    state.slots.mark(dest_slot);
    Ok(())
}

fn duplicate_matrix(
    state: &mut InstanceState,
    op_index: usize,
    src_slot: usize,
    dest_slot: usize,
) -> Result<()> {
    state.slots.check_read(op_index, src_slot)?;
    state.slots.check_write(op_index, dest_slot)?;

    state.matrices[dest_slot] = state.matrices[src_slot];
    state.visibility[dest_slot] = state.visibility[src_slot];
    state.slots.mark(dest_slot);
    Ok(())
}

fn mix_matrices(
    state: &mut InstanceState,
    op_index: usize,
    dest_slot: usize,
    sources: &[BlendSource],
) -> Result<()> {
    for source in sources {
        state.slots.check_read(op_index, source.slot)?;
    }
    state.slots.check_write(op_index, dest_slot)?;

    // Accumulate on the stack so `dest_slot` may also be a source.
    let mut mixed = Mat4::ZERO;
    let mut visibility = IntersectionState::FullyOutside;
    for source in sources {
        mixed += state.matrices[source.slot] * source.weight;
        visibility = most_visible(visibility, state.visibility[source.slot]);
    }

    state.matrices[dest_slot] = mixed;
    state.visibility[dest_slot] = visibility;
    state.slots.mark(dest_slot);
    Ok(())
}

fn apply_inverse_bind(
    model: &ModelDefinition,
    state: &mut InstanceState,
    op_index: usize,
    node_id: usize,
    slot: usize,
) -> Result<()> {
    let node = model.node(op_index, node_id)?;
    state.slots.check_read(op_index, slot)?;

    state.matrices[slot] *= node.inverse_bind_matrix;
    Ok(())
}

fn most_visible(a: IntersectionState, b: IntersectionState) -> IntersectionState {
    use crate::scene::frustum::IntersectionState::{FullyInside, FullyOutside, PartialIntersect};
    match (a, b) {
        (FullyInside, _) | (_, FullyInside) => FullyInside,
        (PartialIntersect, _) | (_, PartialIntersect) => PartialIntersect,
        (FullyOutside, FullyOutside) => FullyOutside,
    }
}

/// Prepares every instance on the rayon pool.
///
/// Instances share their `Arc<ModelDefinition>` read-only and each owns its
/// state, so no locking is involved. Returns the first error encountered.
#[cfg(feature = "parallel")]
pub fn evaluate_instances_parallel(
    instances: &mut [crate::scene::instance::ModelInstance],
    classifier: &(impl FrustumClassifier + Sync),
) -> Result<()> {
    use rayon::prelude::*;

    instances
        .par_iter_mut()
        .try_for_each(|instance| instance.prepare(classifier).map(|_| ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_visible_prefers_inside() {
        use crate::scene::frustum::IntersectionState::{FullyInside, FullyOutside, PartialIntersect};
        assert_eq!(most_visible(FullyOutside, FullyOutside), FullyOutside);
        assert_eq!(most_visible(FullyOutside, PartialIntersect), PartialIntersect);
        assert_eq!(most_visible(PartialIntersect, FullyInside), FullyInside);
    }
}
