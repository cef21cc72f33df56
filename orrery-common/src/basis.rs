use crate::matrix::Mat3;
use crate::rotation::rodrigues;
use crate::vecmath::{Vec3, Vector};
use serde::{Deserialize, Serialize};

/// Three vectors spanning a local coordinate system, normally orthonormal.
///
/// Orthonormality is kept only as long as every mutation is a true rotation.
/// `rotate` never re-orthonormalizes, so long chains of small rotations drift;
/// call [`Basis::orthonormalize`] explicitly when that matters.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Basis {
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
}

impl Default for Basis {
    fn default() -> Self {
        Self::standard()
    }
}

impl Basis {
    pub const fn new(v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        Self { v1, v2, v3 }
    }

    /// The world axes e1, e2, e3.
    pub const fn standard() -> Self {
        Self::new(Vec3::unit_x(), Vec3::unit_y(), Vec3::unit_z())
    }

    /// Replaces each frame vector `v` with `matrix * v`.
    pub fn rotate(&mut self, matrix: &Mat3) {
        self.v1 = matrix * self.v1;
        self.v2 = matrix * self.v2;
        self.v3 = matrix * self.v3;
    }

    /// Rotates by `angle` radians about `axis`, which must already be unit length.
    pub fn rotate_about(&mut self, axis: Vec3, angle: f64) {
        self.rotate(&rodrigues(axis, angle));
    }

    /// Expresses a world vector in this frame's local coordinates.
    #[inline(always)]
    pub fn coordinates(&self, vector: Vec3) -> Vec3 {
        Vec3::new(vector.dot(self.v1), vector.dot(self.v2), vector.dot(self.v3))
    }

    /// Local coordinates back to world space (exact inverse of
    /// [`coordinates`](Self::coordinates) while the frame is orthonormal).
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.v1 * local.x + self.v2 * local.y + self.v3 * local.z
    }

    /// Matrix whose rows are the frame vectors; `as_matrix() * v == coordinates(v)`.
    pub fn as_matrix(&self) -> Mat3 {
        Mat3::from_rows(self.v1, self.v2, self.v3)
    }

    /// Largest deviation of the Gram matrix from identity. Zero for an exact
    /// orthonormal frame.
    pub fn orthonormality_error(&self) -> f64 {
        let gram = self.as_matrix() * self.as_matrix().transpose();
        gram.max_difference(&Mat3::identity())
    }

    /// Gram-Schmidt in frame order: v1 keeps its direction, v2 is made
    /// orthogonal to v1, v3 to both.
    pub fn orthonormalize(&mut self) {
        let v1 = self.v1.normalize();
        let v2 = (self.v2 - v1 * self.v2.dot(v1)).normalize();
        let v3 = (self.v3 - v1 * self.v3.dot(v1) - v2 * self.v3.dot(v2)).normalize();
        *self = Self::new(v1, v2, v3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IDENTITY;
    use crate::rotation::{rotation_y, rotation_z};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn identity_rotation_leaves_frame_unchanged() {
        let mut basis = Basis::standard();
        basis.rotate(&IDENTITY);
        assert_eq!(basis, Basis::standard());

        let mut tilted = Basis::standard();
        tilted.rotate(&rotation_y(0.3));
        let before = tilted;
        tilted.rotate(&IDENTITY);
        assert_eq!(tilted, before);
    }

    #[test]
    fn coordinates_in_standard_frame_are_identity() {
        let v = Vec3::new(1.5, -2.0, 3.0);
        assert_eq!(Basis::standard().coordinates(v), v);
    }

    #[test]
    fn coordinates_after_quarter_turn() {
        let mut basis = Basis::standard();
        basis.rotate_about(Vec3::unit_z(), FRAC_PI_2);
        // v1 now points along world +y
        let local = basis.coordinates(Vec3::unit_y());
        assert!(local.approx_eq(Vec3::unit_x(), 1e-12));
        assert!(basis.as_matrix().apply(Vec3::unit_y()).approx_eq(local, 1e-15));
    }

    #[test]
    fn to_world_inverts_coordinates() {
        let mut basis = Basis::standard();
        basis.rotate_about(Vec3::new(1.0, 1.0, 0.0).normalize(), 0.8);
        let p = Vec3::new(0.25, 4.0, -3.0);
        assert!(basis.to_world(basis.coordinates(p)).approx_eq(p, 1e-12));
    }

    #[test]
    fn non_rotation_matrix_breaks_orthonormality() {
        let mut basis = Basis::standard();
        basis.rotate(&(IDENTITY * 2.0));
        assert_abs_diff_eq!(basis.orthonormality_error(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn orthonormalize_repairs_skewed_frame() {
        let mut basis = Basis::new(
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.3, 1.0, 0.0),
            Vec3::new(0.1, 0.2, 0.9),
        );
        basis.orthonormalize();
        assert!(basis.orthonormality_error() < 1e-12);
        assert!(basis.v1.approx_eq(Vec3::unit_x(), 1e-12));
        assert!(basis.v3.approx_eq(Vec3::unit_z(), 1e-12));
        let mut turned = Basis::standard();
        turned.rotate(&rotation_z(0.2));
        let before = turned;
        turned.orthonormalize();
        assert!(turned.v2.approx_eq(before.v2, 1e-12));
    }
}
