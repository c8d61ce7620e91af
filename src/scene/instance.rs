//! Per-instance evaluation state.
//!
//! [`InstanceState`] is the flat matrix/visibility table the interpreter
//! fills each frame. [`ModelInstance`] wraps it together with the instance's
//! placement, culling flags and swappable animation bindings.

use std::sync::Arc;

use glam::Mat4;

use crate::animation::clock::AnimationController;
use crate::animation::node_tree::{NodeMatrixAnimator, NodeVisibilityAnimator, SkeletalNodeAnimator};
use crate::animation::skeletal::{Bone, SkeletalAnimation};
use crate::errors::Result;
use crate::scene::frustum::{FrustumClassifier, IntersectionState};
use crate::scene::interpreter::{NodeOverrides, evaluate_instance_with_settings};
use crate::scene::model::{ModelDefinition, ROOT_SLOT, SlotTracker};
use crate::settings::EvaluationSettings;

// ============================================================================
// InstanceState
// ============================================================================

/// Matrices and visibility computed for one instance of a model.
///
/// Transient: every pass recomputes it from scratch. Each instance owns its
/// state exclusively, so instances of one model may be evaluated on
/// different threads.
#[derive(Debug, Clone, Default)]
pub struct InstanceState {
    pub(crate) matrices: Vec<Mat4>,
    pub(crate) visibility: Vec<IntersectionState>,
    pub(crate) node_visible: Vec<bool>,
    pub(crate) slots: SlotTracker,
}

impl InstanceState {
    #[must_use]
    pub fn new(model: &ModelDefinition) -> Self {
        let mut state = Self::default();
        state.resize_for(model);
        state
    }

    fn resize_for(&mut self, model: &ModelDefinition) {
        let count = model.world_matrix_count;
        if self.matrices.len() != count {
            self.matrices.resize(count, Mat4::IDENTITY);
            self.visibility.resize(count, IntersectionState::FullyOutside);
        }
        if self.node_visible.len() != model.nodes.len() {
            self.node_visible.resize(model.nodes.len(), true);
        }
    }

    /// Sizes the tables for `model` and forgets which slots were resolved,
    /// keeping the root seed.
    pub(crate) fn begin_pass(&mut self, model: &ModelDefinition) {
        self.resize_for(model);
        self.slots.reset(self.matrices.len());
    }

    /// Writes the instance's model matrix and root classification into
    /// slot 0. Must precede evaluation.
    pub fn seed_root(&mut self, model_matrix: Mat4, visibility: IntersectionState) {
        if let Some(root) = self.matrices.get_mut(ROOT_SLOT) {
            *root = model_matrix;
            self.visibility[ROOT_SLOT] = visibility;
        }
    }

    /// Marks every slot and node as not drawn.
    pub fn mark_all_outside(&mut self) {
        self.visibility.fill(IntersectionState::FullyOutside);
        self.node_visible.fill(false);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    #[inline]
    #[must_use]
    pub fn matrix(&self, slot: usize) -> Option<&Mat4> {
        self.matrices.get(slot)
    }

    #[inline]
    #[must_use]
    pub fn visibility(&self, slot: usize) -> Option<IntersectionState> {
        self.visibility.get(slot).copied()
    }

    #[inline]
    #[must_use]
    pub fn is_slot_visible(&self, slot: usize) -> bool {
        self.visibility(slot).is_some_and(IntersectionState::is_visible)
    }

    /// Animated (or static) visibility bit of a node after the last pass.
    #[inline]
    #[must_use]
    pub fn is_node_visible(&self, node_id: usize) -> bool {
        self.node_visible.get(node_id).copied().unwrap_or(false)
    }

    /// Whether any slot written by the tape survived culling.
    ///
    /// The root slot counts only when the tape rewrote it. Falls back to the
    /// root seed for tapes that write no slots.
    #[must_use]
    pub fn is_any_visible(&self) -> bool {
        let mut any_written = false;
        for (slot, state) in self.visibility.iter().enumerate() {
            if !self.slots.is_written(slot) {
                continue;
            }
            any_written = true;
            if state.is_visible() {
                return true;
            }
        }
        !any_written && self.is_slot_visible(ROOT_SLOT)
    }

    /// Matrix table as raw bytes, ready for a uniform/storage buffer upload.
    #[must_use]
    pub fn matrices_as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }
}

// ============================================================================
// ModelInstance
// ============================================================================

/// An animator together with the clock that drives it.
#[derive(Debug)]
pub struct AnimatorBinding<T: ?Sized> {
    pub animator: Arc<T>,
    pub controller: AnimationController,
}

impl<T: ?Sized> Clone for AnimatorBinding<T> {
    fn clone(&self) -> Self {
        Self {
            animator: Arc::clone(&self.animator),
            controller: self.controller,
        }
    }
}

impl<T: ?Sized> AnimatorBinding<T> {
    #[inline]
    fn frame(&self) -> f32 {
        self.controller.time_in_frames()
    }
}

/// One placed, possibly animated, copy of a model.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    model: Arc<ModelDefinition>,
    state: InstanceState,
    settings: EvaluationSettings,

    pub model_matrix: Mat4,
    pub visible: bool,
    /// Skyboxes are never culled.
    pub is_skybox: bool,

    node_animator: Option<AnimatorBinding<dyn NodeMatrixAnimator>>,
    visibility_animator: Option<AnimatorBinding<dyn NodeVisibilityAnimator>>,

    model_visibility: IntersectionState,
}

impl ModelInstance {
    #[must_use]
    pub fn new(model: Arc<ModelDefinition>) -> Self {
        Self::with_settings(model, EvaluationSettings::default())
    }

    #[must_use]
    pub fn with_settings(model: Arc<ModelDefinition>, settings: EvaluationSettings) -> Self {
        let state = InstanceState::new(&model);
        Self {
            model,
            state,
            settings,
            model_matrix: Mat4::IDENTITY,
            visible: true,
            is_skybox: false,
            node_animator: None,
            visibility_animator: None,
            model_visibility: IntersectionState::FullyOutside,
        }
    }

    #[inline]
    #[must_use]
    pub fn model(&self) -> &Arc<ModelDefinition> {
        &self.model
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    /// Whole-instance classification from the last [`prepare`](Self::prepare).
    #[inline]
    #[must_use]
    pub fn model_visibility(&self) -> IntersectionState {
        self.model_visibility
    }

    fn new_controller(&self) -> AnimationController {
        AnimationController::new(self.settings.frames_per_second)
    }

    // ========================================================================
    // Bindings
    // ========================================================================

    /// Replaces the node-matrix animator, driven by a fresh controller.
    pub fn bind_node_animator(&mut self, animator: Arc<dyn NodeMatrixAnimator>) {
        let controller = self.new_controller();
        self.bind_node_animator_with_controller(animator, controller);
    }

    pub fn bind_node_animator_with_controller(
        &mut self,
        animator: Arc<dyn NodeMatrixAnimator>,
        controller: AnimationController,
    ) {
        log::debug!("Model '{}': node animator bound", self.model.name);
        self.node_animator = Some(AnimatorBinding {
            animator,
            controller,
        });
    }

    /// Binds a skeletal animation, treating `bones[i].id` as node ids.
    pub fn bind_skeletal_animation(&mut self, animation: Arc<SkeletalAnimation>, bones: &[Bone]) {
        self.bind_node_animator(Arc::new(SkeletalNodeAnimator::new(animation, bones)));
    }

    pub fn unbind_node_animator(&mut self) -> Option<AnimatorBinding<dyn NodeMatrixAnimator>> {
        let previous = self.node_animator.take();
        if previous.is_some() {
            log::debug!("Model '{}': node animator unbound", self.model.name);
        }
        previous
    }

    pub fn bind_visibility_animator(&mut self, animator: Arc<dyn NodeVisibilityAnimator>) {
        let controller = self.new_controller();
        self.bind_visibility_animator_with_controller(animator, controller);
    }

    pub fn bind_visibility_animator_with_controller(
        &mut self,
        animator: Arc<dyn NodeVisibilityAnimator>,
        controller: AnimationController,
    ) {
        log::debug!("Model '{}': visibility animator bound", self.model.name);
        self.visibility_animator = Some(AnimatorBinding {
            animator,
            controller,
        });
    }

    pub fn unbind_visibility_animator(
        &mut self,
    ) -> Option<AnimatorBinding<dyn NodeVisibilityAnimator>> {
        let previous = self.visibility_animator.take();
        if previous.is_some() {
            log::debug!("Model '{}': visibility animator unbound", self.model.name);
        }
        previous
    }

    pub fn node_controller_mut(&mut self) -> Option<&mut AnimationController> {
        self.node_animator.as_mut().map(|b| &mut b.controller)
    }

    pub fn visibility_controller_mut(&mut self) -> Option<&mut AnimationController> {
        self.visibility_animator.as_mut().map(|b| &mut b.controller)
    }

    /// Ticks every bound controller by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if let Some(binding) = &mut self.node_animator {
            binding.controller.update(dt);
        }
        if let Some(binding) = &mut self.visibility_animator {
            binding.controller.update(dt);
        }
    }

    // ========================================================================
    // Per-frame evaluation
    // ========================================================================

    /// Classifies the whole instance before any node is placed.
    pub fn compute_root_visibility(&self, classifier: &impl FrustumClassifier) -> IntersectionState {
        if !self.visible {
            return IntersectionState::FullyOutside;
        }
        if self.is_skybox {
            return IntersectionState::FullyInside;
        }
        match &self.model.bbox {
            Some(bbox) if !classifier.classify(bbox, &self.model_matrix).is_visible() => {
                IntersectionState::FullyOutside
            }
            _ => IntersectionState::PartialIntersect,
        }
    }

    /// Evaluates the node tree for this frame.
    ///
    /// Returns the instance's overall classification. A culled instance skips
    /// the tape entirely and has every slot marked fully outside.
    pub fn prepare(&mut self, classifier: &impl FrustumClassifier) -> Result<IntersectionState> {
        let root_visibility = self.compute_root_visibility(classifier);

        if root_visibility == IntersectionState::FullyOutside {
            self.state.begin_pass(&self.model);
            self.state.mark_all_outside();
            self.model_visibility = IntersectionState::FullyOutside;
            return Ok(self.model_visibility);
        }

        self.state.begin_pass(&self.model);
        self.state.seed_root(self.model_matrix, root_visibility);

        let overrides = NodeOverrides {
            matrix: self
                .node_animator
                .as_ref()
                .map(|b| (&*b.animator, b.frame())),
            visibility: self
                .visibility_animator
                .as_ref()
                .map(|b| (&*b.animator, b.frame())),
        };

        if let Err(err) = evaluate_instance_with_settings(
            &self.model,
            &mut self.state,
            &overrides,
            classifier,
            &self.settings,
        ) {
            log::error!("Model '{}': node tree evaluation failed: {err}", self.model.name);
            self.state.mark_all_outside();
            self.model_visibility = IntersectionState::FullyOutside;
            return Err(err);
        }

        self.model_visibility = if self.state.is_any_visible() {
            root_visibility
        } else {
            IntersectionState::FullyOutside
        };
        Ok(self.model_visibility)
    }
}
