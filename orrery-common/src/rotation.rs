//! Rotation matrices from axis-angle pairs.
//!
//! [`rodrigues`] is the unchecked hot-path builder: the axis must already be
//! unit length. Input arriving from a host (mouse deltas, config) should go
//! through [`UnitVec3`] and [`axis_angle`], which reject degenerate axes.

use crate::matrix::Mat3;
use crate::vecmath::{Vec3, Vector};
use anyhow::Result;
use serde::Serialize;

/// Rotation by `angle` radians about the unit vector `axis`.
///
/// `R = I + W sin(angle) + W^2 * 2 sin^2(angle / 2)` where `W` is the
/// cross-product matrix of `axis`. A non-unit axis produces a matrix that is
/// not a rotation; nothing checks for that here.
pub fn rodrigues(axis: Vec3, angle: f64) -> Mat3 {
    let w = Mat3::skew(axis);
    let half_sin = (angle / 2.0).sin();
    Mat3::identity() + w * angle.sin() + (w * w) * (2.0 * half_sin * half_sin)
}

/// Checked variant of [`rodrigues`].
pub fn axis_angle(axis: UnitVec3, angle: f64) -> Mat3 {
    rodrigues(axis.get(), angle)
}

/// Counter-clockwise rotation about the world X axis.
pub fn rotation_x(angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    Mat3::new([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
}

/// Counter-clockwise rotation about the world Y axis.
pub fn rotation_y(angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    Mat3::new([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
}

/// Counter-clockwise rotation about the world Z axis.
pub fn rotation_z(angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    Mat3::new([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
}

/// A 3-D vector known to have unit length.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct UnitVec3(Vec3);

impl UnitVec3 {
    pub const X: UnitVec3 = UnitVec3(Vec3::unit_x());
    pub const Y: UnitVec3 = UnitVec3(Vec3::unit_y());
    pub const Z: UnitVec3 = UnitVec3(Vec3::unit_z());

    /// Normalizes `v`, rejecting zero-length and non-finite input.
    pub fn new(v: Vec3) -> Result<Self> {
        if !v.is_finite() {
            anyhow::bail!("rotation axis {} has non-finite components", v);
        }
        let len = v.length();
        if len <= f64::EPSILON {
            anyhow::bail!("rotation axis {} has zero length", v);
        }
        Ok(Self(v / len))
    }

    #[inline(always)]
    pub fn get(self) -> Vec3 {
        self.0
    }
}

impl From<UnitVec3> for Vec3 {
    fn from(u: UnitVec3) -> Vec3 {
        u.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IDENTITY;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn zero_angle_is_identity() {
        let axis = Vec3::new(1.0, 2.0, -2.0) / 3.0;
        assert!(rodrigues(axis, 0.0).approx_eq(&IDENTITY, 1e-15));
    }

    #[test]
    fn rotation_then_inverse_is_identity() {
        let axis = UnitVec3::new(Vec3::new(0.3, -0.4, 1.2)).unwrap();
        for angle in [0.01, 0.7, PI / 3.0, 2.5, -1.1] {
            let r = axis_angle(axis, angle);
            let back = axis_angle(axis, -angle);
            assert!((r * back).approx_eq(&IDENTITY, 1e-12), "angle {angle}");
        }
    }

    #[test]
    fn rotation_is_orthogonal_with_unit_determinant() {
        let r = axis_angle(UnitVec3::new(Vec3::new(1.0, 1.0, 1.0)).unwrap(), 0.9);
        assert!((r * r.transpose()).approx_eq(&IDENTITY, 1e-12));
        assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn matches_textbook_form() {
        let axis = Vec3::new(2.0, -1.0, 0.5).normalize();
        let angle: f64 = 1.3;
        let w = Mat3::skew(axis);
        let textbook = IDENTITY + w * angle.sin() + (w * w) * (1.0 - angle.cos());
        assert!(rodrigues(axis, angle).approx_eq(&textbook, 1e-12));
    }

    #[test]
    fn quarter_turn_about_z() {
        let r = axis_angle(UnitVec3::Z, FRAC_PI_2);
        assert!((r * Vec3::unit_x()).approx_eq(Vec3::unit_y(), 1e-12));
        assert!(r.approx_eq(&rotation_z(FRAC_PI_2), 1e-12));
        assert!(axis_angle(UnitVec3::X, 0.4).approx_eq(&rotation_x(0.4), 1e-12));
        assert!(axis_angle(UnitVec3::Y, 0.4).approx_eq(&rotation_y(0.4), 1e-12));
    }

    #[test]
    fn unit_vector_rejects_degenerate_axes() {
        assert!(UnitVec3::new(Vec3::ZERO).is_err());
        assert!(UnitVec3::new(Vec3::new(f64::NAN, 0.0, 1.0)).is_err());
        let u = UnitVec3::new(Vec3::new(0.0, 3.0, 4.0)).unwrap();
        assert_abs_diff_eq!(u.get().length(), 1.0, epsilon = 1e-15);
    }
}
