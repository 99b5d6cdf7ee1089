//! Spatial transform values.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A 4x4 affine/linear transform.
///
/// Composition follows matrix order: `a * b` applies `b` first, then `a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTransformation(Mat4);

impl LinearTransformation {
    pub fn identity() -> Self {
        Self(Mat4::IDENTITY)
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        Self(matrix)
    }

    pub fn translation(offset: Vec3) -> Self {
        Self(Mat4::from_translation(offset))
    }

    pub fn scaling(scale: Vec3) -> Self {
        Self(Mat4::from_scale(scale))
    }

    pub fn rotation(rotation: Quat) -> Self {
        Self(Mat4::from_quat(rotation))
    }

    pub fn matrix(&self) -> Mat4 {
        self.0
    }

    /// `self * other`.
    pub fn multiply(&self, other: &LinearTransformation) -> Self {
        Self(self.0 * other.0)
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.0.transform_point3(point)
    }

    pub fn abs_diff_eq(&self, other: &LinearTransformation, max_abs_diff: f32) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }
}

impl Default for LinearTransformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for LinearTransformation {
    type Output = LinearTransformation;

    fn mul(self, rhs: LinearTransformation) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl From<Mat4> for LinearTransformation {
    fn from(matrix: Mat4) -> Self {
        Self(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_default() {
        assert_eq!(LinearTransformation::default(), LinearTransformation::identity());
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(LinearTransformation::identity().transform_point(p), p);
    }

    #[test]
    fn test_composition_order() {
        let translate = LinearTransformation::translation(Vec3::new(10.0, 0.0, 0.0));
        let scale = LinearTransformation::scaling(Vec3::splat(2.0));

        // Scale first, then translate.
        let composed = translate * scale;
        assert_eq!(
            composed.transform_point(Vec3::new(1.0, 1.0, 1.0)),
            Vec3::new(12.0, 2.0, 2.0)
        );
    }

    #[test]
    fn test_inverse() {
        let t = LinearTransformation::translation(Vec3::new(1.0, -2.0, 3.0));
        assert!((t * t.inverse()).abs_diff_eq(&LinearTransformation::identity(), 1e-6));
    }
}
