use crate::body::{BodyId, CelestialBody};
use crate::integrator::{kinetic_energy, total_momentum, Gravity};
use crate::vecmath::Vector;
use serde::{Deserialize, Serialize};

/// State of one body at snapshot time. Components are stored as plain lists
/// so 2-D and 3-D runs share one file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub id: BodyId,
    pub mass: f64,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
}

/// A recorded observation of the whole system at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)] // Derive traits for easy saving/loading
pub struct Snapshot {
    /// Simulation time at which the snapshot was taken.
    pub time: f64,
    /// Number of ticks completed.
    pub step: u32,
    pub bodies: Vec<BodyState>,
    /// `sum m_i v_i`; should stay nearly constant for a closed system.
    pub total_momentum: Vec<f64>,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
}

impl Snapshot {
    pub fn capture<V: Vector>(time: f64, step: u32, bodies: &[CelestialBody<V>], gravity: &Gravity) -> Self {
        Snapshot {
            time,
            step,
            bodies: bodies
                .iter()
                .map(|b| BodyState {
                    id: b.id(),
                    mass: b.mass,
                    position: b.position.to_vec(),
                    velocity: b.velocity.to_vec(),
                })
                .collect(),
            total_momentum: total_momentum(bodies).to_vec(),
            kinetic_energy: kinetic_energy(bodies),
            potential_energy: gravity.potential_energy(bodies),
        }
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy + self.potential_energy
    }
}
