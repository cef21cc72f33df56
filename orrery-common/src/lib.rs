pub mod basis;
pub mod body;
pub mod camera;
pub mod config;
pub mod integrator;
pub mod matrix;
pub mod rotation;
pub mod scenario;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use basis::Basis;
pub use body::{BodyFactory, BodyId, CelestialBody};
pub use camera::{Axis, Camera, Direction, Viewport};
pub use config::{BodyConfig, CameraConfig, ClusterConfig, OutputConfig, PhysicsConfig, SimulationConfig, TimingConfig};
pub use integrator::{advance, gravitational_force, Gravity, G};
pub use matrix::{Mat3, IDENTITY};
pub use rotation::{axis_angle, rodrigues, UnitVec3};
pub use snapshot::{BodyState, Snapshot};
pub use vecmath::{cross, distance, dot, normalize, Vec2, Vec3, Vector};
