use crate::vecmath::{Vec3, Vector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

/// A 3x3 matrix stored row-major.
///
/// The type does not know whether it holds a rotation. Callers that build
/// rotations (see [`crate::rotation`]) are responsible for valid input.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    pub rows: [[f64; 3]; 3],
}

pub const IDENTITY: Mat3 = Mat3::identity();

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat3 {
    pub const fn new(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    pub const fn identity() -> Self {
        Self::new([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    pub const fn zero() -> Self {
        Self::new([[0.0; 3]; 3])
    }

    pub fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self::new([[r0.x, r0.y, r0.z], [r1.x, r1.y, r1.z], [r2.x, r2.y, r2.z]])
    }

    /// Cross-product matrix: `skew(a) * v == cross(a, v)`.
    pub fn skew(a: Vec3) -> Self {
        Self::new([[0.0, -a.z, a.y], [a.z, 0.0, -a.x], [-a.y, a.x, 0.0]])
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> Vec3 {
        let r = self.rows[i];
        Vec3::new(r[0], r[1], r[2])
    }

    pub fn add(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn scale(&self, scalar: f64) -> Self {
        self.map(|a| a * scalar)
    }

    /// Row-by-column product; `(A*B)[i][j] = sum_k A[i][k] * B[k][j]`.
    pub fn multiply(&self, other: &Self) -> Self {
        let mut out = Self::zero();
        for i in 0..3 {
            for j in 0..3 {
                out.rows[i][j] = (0..3).map(|k| self.rows[i][k] * other.rows[k][j]).sum();
            }
        }
        out
    }

    /// Applies the matrix as a linear map to a column vector.
    #[inline(always)]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        Vec3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::zero();
        for i in 0..3 {
            for j in 0..3 {
                out.rows[i][j] = self.rows[j][i];
            }
        }
        out
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.rows;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Largest absolute entrywise difference.
    pub fn max_difference(&self, other: &Self) -> f64 {
        self.sub(other)
            .rows
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()))
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.max_difference(other) <= tolerance
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut out = *self;
        out.rows.iter_mut().flatten().for_each(|a| *a = f(*a));
        out
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut out = Self::zero();
        for i in 0..3 {
            for j in 0..3 {
                out.rows[i][j] = f(self.rows[i][j], other.rows[i][j]);
            }
        }
        out
    }
}

impl Add for Mat3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self { Mat3::add(&self, &rhs) }
}

impl Sub for Mat3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self { Mat3::sub(&self, &rhs) }
}

impl Mul for Mat3 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self { self.multiply(&rhs) }
}

impl Mul<f64> for Mat3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self { self.scale(scalar) }
}

impl Div<f64> for Mat3 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self { self.map(|a| a / scalar) }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 { self.apply(v) }
}

impl Mul<Vec3> for &Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 { self.apply(v) }
}

impl Index<(usize, usize)> for Mat3 {
    type Output = f64;
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.rows[row][col]
    }
}

impl IndexMut<(usize, usize)> for Mat3 {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.rows[row][col]
    }
}

impl fmt::Display for Mat3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "[{:10.6} {:10.6} {:10.6}]", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}
