//! Static model definition.
//!
//! A [`ModelDefinition`] is produced once by a parser and shared read-only by
//! every instance of the model. Its node-tree tape is a flat list of
//! [`NodeTreeOp`]s executed in order against a table of world-matrix slots.

use glam::Mat4;
use smallvec::SmallVec;

use crate::errors::{Result, SkelError};
use crate::scene::bounds::BoundingBox;

/// Slot holding the instance's model matrix.
pub const ROOT_SLOT: usize = 0;

/// A node of the model hierarchy. Nodes are identified by their index in
/// [`ModelDefinition::nodes`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModelNode {
    pub name: String,
    /// Parent-relative bind-pose matrix.
    pub bind_matrix: Mat4,
    pub inverse_bind_matrix: Mat4,
    pub bbox: Option<BoundingBox>,
    /// World-matrix slot this node resolves into, if it owns one.
    pub matrix_slot: Option<usize>,
    /// Static visibility bit, overridable by a visibility animator.
    pub visible: bool,
}

impl Default for ModelNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            bind_matrix: Mat4::IDENTITY,
            inverse_bind_matrix: Mat4::IDENTITY,
            bbox: None,
            matrix_slot: None,
            visible: true,
        }
    }
}

impl ModelNode {
    #[must_use]
    pub fn new(name: impl Into<String>, bind_matrix: Mat4) -> Self {
        Self {
            name: name.into(),
            bind_matrix,
            ..Default::default()
        }
    }

    /// Derives the inverse-bind matrix from the node's bind-pose world matrix.
    #[must_use]
    pub fn with_bind_world(mut self, bind_world: Mat4) -> Self {
        self.inverse_bind_matrix = bind_world.inverse();
        self
    }

    #[must_use]
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    #[must_use]
    pub fn with_matrix_slot(mut self, slot: usize) -> Self {
        self.matrix_slot = Some(slot);
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// One weighted input of a [`NodeTreeOp::MixMatrices`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendSource {
    pub slot: usize,
    pub weight: f32,
}

impl BlendSource {
    #[must_use]
    pub const fn new(slot: usize, weight: f32) -> Self {
        Self { slot, weight }
    }
}

/// Node-tree bytecode instruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum NodeTreeOp {
    /// `matrix[dest] = matrix[parent] * local(node)`, with visibility
    /// propagated from the parent slot.
    PlaceNode {
        node_id: usize,
        parent_slot: usize,
        dest_slot: usize,
    },
    /// Copies a resolved matrix and its visibility into another slot.
    DuplicateMatrix { src_slot: usize, dest_slot: usize },
    /// `matrix[dest] = sum(matrix[src] * weight)`.
    MixMatrices {
        dest_slot: usize,
        sources: SmallVec<[BlendSource; 4]>,
    },
    /// `matrix[slot] = matrix[slot] * node.inverse_bind_matrix`.
    ApplyInverseBind { node_id: usize, slot: usize },
}

impl NodeTreeOp {
    #[must_use]
    pub fn place_node(node_id: usize, parent_slot: usize, dest_slot: usize) -> Self {
        Self::PlaceNode {
            node_id,
            parent_slot,
            dest_slot,
        }
    }

    #[must_use]
    pub fn duplicate(src_slot: usize, dest_slot: usize) -> Self {
        Self::DuplicateMatrix {
            src_slot,
            dest_slot,
        }
    }

    #[must_use]
    pub fn mix(dest_slot: usize, sources: impl IntoIterator<Item = (usize, f32)>) -> Self {
        Self::MixMatrices {
            dest_slot,
            sources: sources
                .into_iter()
                .map(|(slot, weight)| BlendSource::new(slot, weight))
                .collect(),
        }
    }

    #[must_use]
    pub fn inverse_bind(node_id: usize, slot: usize) -> Self {
        Self::ApplyInverseBind { node_id, slot }
    }
}

/// Tracks which slots a pass has written so far.
///
/// Shared by load-time validation and the interpreter so both reject the same
/// tapes.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotTracker {
    resolved: Vec<bool>,
    root_written: bool,
}

impl SlotTracker {
    /// Resets for a new pass over `len` slots; only the root starts resolved.
    pub(crate) fn reset(&mut self, len: usize) {
        self.resolved.clear();
        self.resolved.resize(len, false);
        self.root_written = false;
        if let Some(root) = self.resolved.get_mut(ROOT_SLOT) {
            *root = true;
        }
    }

    pub(crate) fn check_write(&self, op_index: usize, slot: usize) -> Result<()> {
        if slot >= self.resolved.len() {
            return Err(SkelError::SlotOutOfRange {
                op_index,
                slot,
                len: self.resolved.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_read(&self, op_index: usize, slot: usize) -> Result<()> {
        self.check_write(op_index, slot)?;
        if !self.resolved[slot] {
            return Err(SkelError::UnresolvedSlot { op_index, slot });
        }
        Ok(())
    }

    pub(crate) fn mark(&mut self, slot: usize) {
        self.resolved[slot] = true;
        if slot == ROOT_SLOT {
            self.root_written = true;
        }
    }

    /// Whether the tape wrote `slot`. The external root seed does not count.
    #[inline]
    pub(crate) fn is_written(&self, slot: usize) -> bool {
        if slot == ROOT_SLOT {
            self.root_written
        } else {
            self.is_resolved(slot)
        }
    }

    #[inline]
    pub(crate) fn is_resolved(&self, slot: usize) -> bool {
        self.resolved.get(slot).copied().unwrap_or(false)
    }
}

/// Parsed, shareable model data.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelDefinition {
    pub name: String,
    pub nodes: Vec<ModelNode>,
    /// Node-tree tape, executed once per frame per instance.
    pub ops: Vec<NodeTreeOp>,
    /// Size of the world-matrix table; slot 0 is the root.
    pub world_matrix_count: usize,
    /// Model-space bounds used for whole-instance culling.
    pub bbox: Option<BoundingBox>,
}

impl ModelDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, world_matrix_count: usize) -> Self {
        Self {
            name: name.into(),
            world_matrix_count,
            ..Default::default()
        }
    }

    /// Appends a node and returns its id.
    pub fn add_node(&mut self, node: ModelNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn push_op(&mut self, op: NodeTreeOp) {
        self.ops.push(op);
    }

    #[inline]
    pub(crate) fn node(&self, op_index: usize, node_id: usize) -> Result<&ModelNode> {
        self.nodes.get(node_id).ok_or(SkelError::NodeOutOfRange {
            op_index,
            node_id,
            len: self.nodes.len(),
        })
    }

    /// Walks the tape once without computing matrices, rejecting references
    /// to missing nodes, out-of-range slots and slots read before written.
    ///
    /// Run this at load time; a validated model cannot fail evaluation.
    pub fn validate(&self) -> Result<()> {
        let mut slots = SlotTracker::default();
        slots.reset(self.world_matrix_count);

        for (op_index, op) in self.ops.iter().enumerate() {
            match op {
                NodeTreeOp::PlaceNode {
                    node_id,
                    parent_slot,
                    dest_slot,
                } => {
                    self.node(op_index, *node_id)?;
                    slots.check_read(op_index, *parent_slot)?;
                    slots.check_write(op_index, *dest_slot)?;
                    slots.mark(*dest_slot);
                }
                NodeTreeOp::DuplicateMatrix {
                    src_slot,
                    dest_slot,
                } => {
                    slots.check_read(op_index, *src_slot)?;
                    slots.check_write(op_index, *dest_slot)?;
                    slots.mark(*dest_slot);
                }
                NodeTreeOp::MixMatrices { dest_slot, sources } => {
                    for source in sources {
                        slots.check_read(op_index, source.slot)?;
                    }
                    slots.check_write(op_index, *dest_slot)?;
                    slots.mark(*dest_slot);
                }
                NodeTreeOp::ApplyInverseBind { node_id, slot } => {
                    self.node(op_index, *node_id)?;
                    slots.check_read(op_index, *slot)?;
                }
            }
        }

        log::debug!(
            "Model '{}' validated: {} nodes, {} ops, {} world matrices",
            self.name,
            self.nodes.len(),
            self.ops.len(),
            self.world_matrix_count
        );
        Ok(())
    }
}
