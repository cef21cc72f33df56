//! Viewer position, orientation and perspective projection.
//!
//! The camera never draws anything. It turns input deltas into frame
//! rotations and world points into 2-D view coordinates for whatever layer
//! does the drawing.

use crate::basis::Basis;
use crate::rotation::{rodrigues, rotation_x, rotation_y, rotation_z};
use crate::vecmath::{cross, Vec2, Vec3, Vector};
use log::trace;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Angle of one key-driven rotation step.
pub const KEY_ROTATION_STEP: f64 = PI / 40.0;
/// Angle of one mouse-look step, independent of the delta's magnitude.
pub const LOOK_ROTATION_STEP: f64 = PI / 100.0;
/// Distance covered by one movement step.
pub const MOVE_STEP: f64 = 0.05;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Frame-relative movement directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Along v3, the viewing direction.
    Forward,
    /// Along v1.
    Right,
    /// Along v2.
    Up,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub basis: Basis,
    /// Repair the frame every this many rotations; `None` leaves drift alone.
    #[serde(default)]
    pub reorthonormalize_interval: Option<u32>,
    #[serde(skip)]
    rotations_since_repair: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(-2.0, -2.0, -2.0))
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            basis: Basis::standard(),
            reorthonormalize_interval: None,
            rotations_since_repair: 0,
        }
    }

    pub fn with_reorthonormalize_interval(mut self, interval: Option<u32>) -> Self {
        self.reorthonormalize_interval = interval;
        self
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Moves `amount` along one of the frame axes.
    pub fn move_along(&mut self, direction: Direction, amount: f64) {
        let axis = match direction {
            Direction::Forward => self.basis.v3,
            Direction::Right => self.basis.v1,
            Direction::Up => self.basis.v2,
        };
        self.translate(axis * amount);
    }

    /// One key-driven rotation step about a world axis.
    ///
    /// X and Z turn counter-clockwise; the Y key turns the other way, taking
    /// `v1` toward `+z`.
    pub fn rotate_key(&mut self, axis: Axis) {
        let matrix = match axis {
            Axis::X => rotation_x(KEY_ROTATION_STEP),
            Axis::Y => rotation_y(-KEY_ROTATION_STEP),
            Axis::Z => rotation_z(KEY_ROTATION_STEP),
        };
        self.basis.rotate(&matrix);
        self.after_rotation();
    }

    /// Mouse-look from a pointer delta.
    ///
    /// The frame turns by [`LOOK_ROTATION_STEP`] about the axis orthogonal to
    /// both the screen normal and the delta. A zero delta does nothing.
    /// Returns whether a rotation happened.
    pub fn look(&mut self, dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        let input = Vec3::new(dx, dy, 0.0).normalize();
        let axis = cross(Vec3::unit_z(), input);
        trace!("look ({}, {}) about {}", dx, dy, axis);
        self.basis.rotate(&rodrigues(axis, LOOK_ROTATION_STEP));
        self.after_rotation();
        true
    }

    pub fn reorthonormalize(&mut self) {
        self.basis.orthonormalize();
        self.rotations_since_repair = 0;
    }

    fn after_rotation(&mut self) {
        self.rotations_since_repair += 1;
        if let Some(interval) = self.reorthonormalize_interval {
            if self.rotations_since_repair >= interval {
                self.reorthonormalize();
            }
        }
    }

    /// World point in camera-local coordinates; `z > 0` is in front.
    #[inline(always)]
    pub fn to_camera_space(&self, point: Vec3) -> Vec3 {
        self.basis.coordinates(point - self.position)
    }
}

/// Maps perspective-divided coordinates onto a screen.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub center: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 200.0, center: Vec2::new(400.0, 400.0) }
    }
}

impl Viewport {
    /// Screen position of a world point, or `None` when it is not in front of the camera.
    pub fn project(&self, camera: &Camera, point: Vec3) -> Option<Vec2> {
        let local = camera.to_camera_space(point);
        if local.z <= 0.0 {
            return None;
        }
        let flat = Vec2::new(local.x / local.z, local.y / local.z);
        Some(flat * self.scale + self.center)
    }

    /// Both endpoints projected, or `None` if either is behind the camera.
    pub fn project_segment(&self, camera: &Camera, a: Vec3, b: Vec3) -> Option<(Vec2, Vec2)> {
        Some((self.project(camera, a)?, self.project(camera, b)?))
    }

    /// Projects any simulation vector; 2-D points are placed in the `z = 0` plane.
    pub fn project_point<V: Vector>(&self, camera: &Camera, point: V) -> Option<Vec2> {
        self.project(camera, point.to_vec3())
    }
}
