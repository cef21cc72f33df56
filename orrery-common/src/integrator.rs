//! Fixed-step gravitational integrator.
//!
//! One tick runs three passes over the whole body set, in this order:
//!
//! 1. `position += velocity * dt` (previous tick's velocity)
//! 2. `velocity += acceleration * dt` (previous tick's acceleration)
//! 3. acceleration recomputed from the new positions
//!
//! Pass 3 sums pairwise Newtonian attraction from every body with a different
//! id. Nothing is guarded: coincident bodies, zero mass, or a zero-length
//! separation produce NaN/Inf that propagate into later ticks.

use crate::body::{BodyId, CelestialBody};
use crate::vecmath::{distance, normalize, Vector};
use rayon::prelude::*;

/// Default gravitational constant.
pub const G: f64 = 0.05;

/// Body count at which the acceleration pass moves onto the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Newtonian gravity with a fixed constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    g: f64,
    parallel_threshold: usize,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(G)
    }
}

/// The per-body data pass 3 reads.
#[derive(Clone, Copy)]
struct Source<V> {
    id: BodyId,
    mass: f64,
    position: V,
}

impl Gravity {
    pub fn new(g: f64) -> Self {
        Self { g, parallel_threshold: DEFAULT_PARALLEL_THRESHOLD }
    }

    /// Sets the body count at or above which pass 3 runs in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn constant(&self) -> f64 {
        self.g
    }

    /// Force exerted on `body` by `other`, pointing from `body` toward `other`.
    pub fn force<V: Vector>(&self, body: &CelestialBody<V>, other: &CelestialBody<V>) -> V {
        self.force_between(body.mass, body.position, other.mass, other.position)
    }

    #[inline(always)]
    fn force_between<V: Vector>(&self, mass: f64, position: V, other_mass: f64, other_position: V) -> V {
        let r = distance(position, other_position);
        let magnitude = mass * other_mass * self.g / (r * r);
        let direction = normalize(other_position - position);
        direction * magnitude
    }

    /// Advances every body by one tick of length `dt`.
    pub fn advance<V: Vector>(&self, bodies: &mut [CelestialBody<V>], dt: f64) {
        for body in bodies.iter_mut() {
            body.position += body.velocity * dt;
            body.velocity += body.acceleration * dt;
        }
        self.update_accelerations(bodies);
    }

    /// Pass 3 on its own: replaces every acceleration with the net
    /// gravitational pull from the other bodies at their current positions.
    pub fn update_accelerations<V: Vector>(&self, bodies: &mut [CelestialBody<V>]) {
        let sources: Vec<Source<V>> = bodies
            .iter()
            .map(|b| Source { id: b.id(), mass: b.mass, position: b.position })
            .collect();

        let accelerate = |body: &mut CelestialBody<V>| {
            body.acceleration = self.acceleration_from(body, &sources);
        };

        if bodies.len() >= self.parallel_threshold {
            bodies.par_iter_mut().for_each(accelerate);
        } else {
            bodies.iter_mut().for_each(accelerate);
        }
    }

    fn acceleration_from<V: Vector>(&self, body: &CelestialBody<V>, sources: &[Source<V>]) -> V {
        let mut acceleration = V::ZERO;
        for other in sources {
            // exclusion is by id, so a duplicated id never attracts itself
            if other.id != body.id() {
                let force = self.force_between(body.mass, body.position, other.mass, other.position);
                acceleration += force / body.mass;
            }
        }
        acceleration
    }

    /// Potential energy summed over unordered pairs, `-G m_i m_j / r`.
    pub fn potential_energy<V: Vector>(&self, bodies: &[CelestialBody<V>]) -> f64 {
        let mut total = 0.0;
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                if a.id() != b.id() {
                    total -= self.g * a.mass * b.mass / distance(a.position, b.position);
                }
            }
        }
        total
    }
}

/// One tick with the default constant [`G`].
pub fn advance<V: Vector>(bodies: &mut [CelestialBody<V>], dt: f64) {
    Gravity::default().advance(bodies, dt);
}

/// Force on `body` from `other` with the default constant [`G`].
pub fn gravitational_force<V: Vector>(body: &CelestialBody<V>, other: &CelestialBody<V>) -> V {
    Gravity::default().force(body, other)
}

/// `sum m_i v_i`.
pub fn total_momentum<V: Vector>(bodies: &[CelestialBody<V>]) -> V {
    bodies.iter().fold(V::ZERO, |acc, b| acc + b.momentum())
}

pub fn kinetic_energy<V: Vector>(bodies: &[CelestialBody<V>]) -> f64 {
    bodies.iter().map(|b| b.kinetic_energy()).sum()
}

/// Mass-weighted mean position. Non-finite for an empty set.
pub fn center_of_mass<V: Vector>(bodies: &[CelestialBody<V>]) -> V {
    let total_mass: f64 = bodies.iter().map(|b| b.mass).sum();
    let weighted = bodies.iter().fold(V::ZERO, |acc, b| acc + b.position * b.mass);
    weighted / total_mass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyFactory;
    use crate::vecmath::{Vec2, Vec3};
    use approx::assert_abs_diff_eq;

    #[test]
    fn single_body_feels_no_force() {
        let mut factory = BodyFactory::new();
        let mut bodies = vec![factory.create(5.0, Vec3::new(1.0, 2.0, 3.0), Vec3::unit_x(), Vec3::unit_y())];
        advance(&mut bodies, 0.5);
        assert_eq!(bodies[0].acceleration, Vec3::ZERO);
    }

    #[test]
    fn bodies_sharing_an_id_do_not_attract() {
        let mut factory = BodyFactory::new();
        let a = factory.create(5.0, Vec2::new(0.0, 0.0), Vec2::ZERO, Vec2::ZERO);
        let mut twin = a;
        twin.position = Vec2::new(3.0, 0.0);
        let mut bodies = vec![a, twin];
        Gravity::default().update_accelerations(&mut bodies);
        assert_eq!(bodies[0].acceleration, Vec2::ZERO);
        assert_eq!(bodies[1].acceleration, Vec2::ZERO);
    }

    #[test]
    fn force_is_antisymmetric_and_inverse_square() {
        let mut factory = BodyFactory::new();
        let a = factory.create(3.0, Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO, Vec3::ZERO);
        let b = factory.create(7.0, Vec3::new(4.0, 5.0, 0.0), Vec3::ZERO, Vec3::ZERO);
        let f_ab = gravitational_force(&a, &b);
        let f_ba = gravitational_force(&b, &a);
        assert!(f_ab.approx_eq(-f_ba, 1e-15));
        // |r| = 5
        assert_abs_diff_eq!(f_ab.length(), G * 21.0 / 25.0, epsilon = 1e-15);
        assert!(f_ab.dot(b.position - a.position) > 0.0);
    }

    #[test]
    fn coincident_bodies_propagate_nan() {
        let mut factory = BodyFactory::new();
        let mut bodies = vec![
            factory.create(1.0, Vec2::new(1.0, 1.0), Vec2::ZERO, Vec2::ZERO),
            factory.create(1.0, Vec2::new(1.0, 1.0), Vec2::ZERO, Vec2::ZERO),
        ];
        advance(&mut bodies, 0.1);
        assert!(bodies.iter().all(|b| b.is_degenerate()));
    }

    #[test]
    fn parallel_pass_matches_serial_pass() {
        let mut factory = BodyFactory::new();
        let bodies: Vec<_> = (0..40)
            .map(|i| {
                let t = i as f64;
                factory.create(
                    1.0 + t,
                    Vec3::new(t.cos() * (5.0 + t), t.sin() * 3.0, 0.1 * t),
                    Vec3::new(-t.sin(), t.cos(), 0.0),
                    Vec3::ZERO,
                )
            })
            .collect();
        let mut serial = bodies.clone();
        let mut parallel = bodies;
        let g = Gravity::new(0.3);
        for _ in 0..5 {
            g.with_parallel_threshold(usize::MAX).advance(&mut serial, 0.01);
            g.with_parallel_threshold(1).advance(&mut parallel, 0.01);
        }
        assert_eq!(serial, parallel);
    }

    #[test]
    fn potential_energy_of_a_pair() {
        let mut factory = BodyFactory::new();
        let bodies = vec![
            factory.create(2.0, Vec2::new(0.0, 0.0), Vec2::ZERO, Vec2::ZERO),
            factory.create(4.0, Vec2::new(0.0, 2.0), Vec2::ZERO, Vec2::ZERO),
        ];
        assert_abs_diff_eq!(Gravity::new(1.0).potential_energy(&bodies), -4.0, epsilon = 1e-15);
        assert!(center_of_mass(&bodies).approx_eq(Vec2::new(0.0, 4.0 / 3.0), 1e-15));
    }
}
