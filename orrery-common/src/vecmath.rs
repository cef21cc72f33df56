use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Operations shared by the 2-D and 3-D vector types.
///
/// The integrator and body model are generic over this trait so the same
/// tick runs in either dimensionality. Everything here is total: degenerate
/// input (normalizing a zero vector) yields non-finite components instead of
/// an error.
pub trait Vector:
    Copy
    + Default
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
{
    /// Number of components.
    const DIM: usize;
    /// The zero vector.
    const ZERO: Self;

    /// Sum of componentwise products.
    fn dot(self, other: Self) -> f64;

    /// Builds a vector from exactly `DIM` components.
    fn from_slice(components: &[f64]) -> Option<Self>;

    /// Components in order.
    fn to_vec(self) -> Vec<f64>;

    /// Lifts the vector into 3-D, padding missing components with zero.
    fn to_vec3(self) -> Vec3;

    fn length_squared(self) -> f64 {
        self.dot(self)
    }

    fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance, computed as `sqrt(dot(v - w, v - w))`.
    fn distance(self, other: Self) -> f64 {
        let d = self - other;
        d.dot(d).sqrt()
    }

    /// `self / |self|`. Non-finite for the zero vector.
    fn normalize(self) -> Self {
        let norm = self.distance(Self::ZERO);
        self * (1.0 / norm)
    }

    fn is_finite(self) -> bool {
        self.to_vec().iter().all(|c| c.is_finite())
    }

    /// True when every component differs by at most `tolerance`.
    fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        self.to_vec()
            .iter()
            .zip(other.to_vec())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// Sum of componentwise products.
#[inline(always)]
pub fn dot<V: Vector>(v: V, w: V) -> f64 {
    v.dot(w)
}

/// Euclidean norm of `v - w`.
#[inline(always)]
pub fn distance<V: Vector>(v: V, w: V) -> f64 {
    v.distance(w)
}

/// Unit vector along `v`. Callers must not pass the zero vector.
#[inline(always)]
pub fn normalize<V: Vector>(v: V) -> V {
    v.normalize()
}

/// Right-hand-rule vector product.
#[inline(always)]
pub fn cross(v: Vec3, w: Vec3) -> Vec3 {
    v.cross(w)
}

// --- 2-D ---

#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[inline(always)]
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
    #[inline(always)]
    pub const fn zero() -> Self { Self::new(0.0, 0.0) }
    #[inline(always)]
    pub fn add(self, other: Self) -> Self { Self::new(self.x + other.x, self.y + other.y) }
    #[inline(always)]
    pub fn sub(self, other: Self) -> Self { Self::new(self.x - other.x, self.y - other.y) }
    #[inline(always)]
    pub fn scale(self, scalar: f64) -> Self { Self::new(self.x * scalar, self.y * scalar) }
}

impl Vector for Vec2 {
    const DIM: usize = 2;
    const ZERO: Self = Vec2::zero();

    #[inline(always)]
    fn dot(self, other: Self) -> f64 { self.x * other.x + self.y * other.y }

    fn from_slice(components: &[f64]) -> Option<Self> {
        match components {
            [x, y] => Some(Self::new(*x, *y)),
            _ => None,
        }
    }

    fn to_vec(self) -> Vec<f64> { vec![self.x, self.y] }

    fn to_vec3(self) -> Vec3 { Vec3::new(self.x, self.y, 0.0) }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self { Vec2::add(self, other) }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self { Vec2::sub(self, other) }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self { self.scale(scalar) }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self { Self::new(self.x / scalar, self.y / scalar) }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self { Self::new(-self.x, -self.y) }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

// --- 3-D ---

#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }
    #[inline(always)]
    pub const fn zero() -> Self { Self::new(0.0, 0.0, 0.0) }
    pub const fn unit_x() -> Self { Self::new(1.0, 0.0, 0.0) }
    pub const fn unit_y() -> Self { Self::new(0.0, 1.0, 0.0) }
    pub const fn unit_z() -> Self { Self::new(0.0, 0.0, 1.0) }
    #[inline(always)]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
    #[inline(always)]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
    #[inline(always)]
    pub fn scale(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }

    /// Right-hand-rule product. Zero when the inputs are parallel.
    #[inline(always)]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl Vector for Vec3 {
    const DIM: usize = 3;
    const ZERO: Self = Vec3::zero();

    #[inline(always)]
    fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    fn from_slice(components: &[f64]) -> Option<Self> {
        match components {
            [x, y, z] => Some(Self::new(*x, *y, *z)),
            _ => None,
        }
    }

    fn to_vec(self) -> Vec<f64> { vec![self.x, self.y, self.z] }

    fn to_vec3(self) -> Vec3 { self }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self { Vec3::add(self, other) }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self { Vec3::sub(self, other) }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self { self.scale(scalar) }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self { Self::new(-self.x, -self.y, -self.z) }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}
