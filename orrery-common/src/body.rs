use crate::vecmath::Vector;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier handed out by a [`BodyFactory`].
pub type BodyId = u32;

/// A point mass advanced by the integrator.
///
/// Mass is not validated on this type; zero or negative mass makes the force
/// computation meaningless. Use [`BodyFactory::try_create`] when the values
/// come from outside the program.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody<V> {
    id: BodyId,
    pub mass: f64,
    pub position: V,
    pub velocity: V,
    pub acceleration: V,
}

impl<V: Vector> CelestialBody<V> {
    #[inline(always)]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Momentum `m * v`.
    pub fn momentum(&self) -> V {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// True if any numeric field has gone NaN or infinite.
    pub fn is_degenerate(&self) -> bool {
        !(self.mass.is_finite()
            && self.position.is_finite()
            && self.velocity.is_finite()
            && self.acceleration.is_finite())
    }
}

impl<V: Vector> fmt::Display for CelestialBody<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Id: {}", self.id)?;
        writeln!(f, "Mass: {:.6}", self.mass)?;
        writeln!(f, "Position: {}", self.position)?;
        writeln!(f, "Velocity: {}", self.velocity)?;
        write!(f, "Acceleration: {}", self.acceleration)
    }
}

/// Creates bodies and owns the id counter.
///
/// Ids increase by one per created body, starting at 0 unless the factory was
/// built with [`BodyFactory::starting_at`]. Use one factory for every body in
/// a run so ids stay unique.
#[derive(Debug, Clone, Default)]
pub struct BodyFactory {
    next_id: BodyId,
}

impl BodyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first_id: BodyId) -> Self {
        Self { next_id: first_id }
    }

    /// The id the next created body will get.
    pub fn peek_next_id(&self) -> BodyId {
        self.next_id
    }

    /// Unchecked construction: assigns the next id and stores the values as given.
    pub fn create<V: Vector>(
        &mut self,
        mass: f64,
        position: V,
        velocity: V,
        acceleration: V,
    ) -> CelestialBody<V> {
        let id = self.next_id;
        self.next_id += 1;
        CelestialBody { id, mass, position, velocity, acceleration }
    }

    /// Like [`create`](Self::create), but rejects non-positive or non-finite mass
    /// and non-finite vectors. No id is consumed on failure.
    pub fn try_create<V: Vector>(
        &mut self,
        mass: f64,
        position: V,
        velocity: V,
        acceleration: V,
    ) -> Result<CelestialBody<V>> {
        if !mass.is_finite() || mass <= 0.0 {
            anyhow::bail!("body mass must be finite and > 0, got {}", mass);
        }
        if !position.is_finite() {
            anyhow::bail!("body position {} is not finite", position);
        }
        if !velocity.is_finite() {
            anyhow::bail!("body velocity {} is not finite", velocity);
        }
        if !acceleration.is_finite() {
            anyhow::bail!("body acceleration {} is not finite", acceleration);
        }
        Ok(self.create(mass, position, velocity, acceleration))
    }
}
