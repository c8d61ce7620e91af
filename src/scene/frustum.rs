//! View-frustum classification.
//!
//! The interpreter never tests visibility itself; it hands bounding volumes to
//! a [`FrustumClassifier`] supplied by the rendering collaborator. [`Frustum`]
//! is the stock implementation, built from a view-projection matrix.

use glam::{Mat4, Vec3, Vec4};

use crate::scene::bounds::BoundingBox;

/// Tri-state result of testing a volume against the view volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntersectionState {
    FullyInside,
    #[default]
    PartialIntersect,
    FullyOutside,
}

impl IntersectionState {
    #[inline]
    #[must_use]
    pub fn is_visible(self) -> bool {
        self != Self::FullyOutside
    }
}

/// Classifies a local-space bounding volume placed by `world`.
pub trait FrustumClassifier {
    fn classify(&self, bbox: &BoundingBox, world: &Mat4) -> IntersectionState;
}

impl<F> FrustumClassifier for F
where
    F: Fn(&BoundingBox, &Mat4) -> IntersectionState,
{
    fn classify(&self, bbox: &BoundingBox, world: &Mat4) -> IntersectionState {
        self(bbox, world)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6], // Left, Right, Bottom, Top, Near, Far
}

impl Frustum {
    /// Extracts planes from a view-projection matrix with a `[0, 1]` depth
    /// range (Gribb-Hartmann).
    #[must_use]
    pub fn from_matrix(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        let mut planes = [
            rows[3] + rows[0], // Left
            rows[3] - rows[0], // Right
            rows[3] + rows[1], // Bottom
            rows[3] - rows[1], // Top
            rows[2],           // Near
            rows[3] - rows[2], // Far
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    #[inline]
    #[must_use]
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }

    /// Classifies a world-space AABB.
    #[must_use]
    pub fn intersect_box(&self, bbox: &BoundingBox) -> IntersectionState {
        let mut state = IntersectionState::FullyInside;

        for plane in &self.planes {
            let normal = plane.truncate();
            // Corner furthest along the plane normal, and its opposite
            let positive = Vec3::select(normal.cmpge(Vec3::ZERO), bbox.max, bbox.min);
            let negative = Vec3::select(normal.cmpge(Vec3::ZERO), bbox.min, bbox.max);

            if normal.dot(positive) + plane.w < 0.0 {
                return IntersectionState::FullyOutside;
            }
            if normal.dot(negative) + plane.w < 0.0 {
                state = IntersectionState::PartialIntersect;
            }
        }

        state
    }

    #[must_use]
    pub fn contains_box(&self, bbox: &BoundingBox) -> bool {
        self.intersect_box(bbox).is_visible()
    }
}

impl FrustumClassifier for Frustum {
    fn classify(&self, bbox: &BoundingBox, world: &Mat4) -> IntersectionState {
        self.intersect_box(&bbox.transform(world))
    }
}
