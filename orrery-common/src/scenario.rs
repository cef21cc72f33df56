use crate::body::{BodyFactory, CelestialBody};
use crate::config::{BodyConfig, ClusterConfig, SimulationConfig};
use crate::vecmath::Vector;
use anyhow::{Context, Result};
use log::{debug, info};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Normal;

/// Builds the initial body set for a run.
///
/// Explicit `[[bodies]]` come first, in file order, followed by the seeded
/// cluster. With neither present the default three-body system is used.
pub fn build_bodies<V: Vector>(
    config: &SimulationConfig,
    factory: &mut BodyFactory,
) -> Result<Vec<CelestialBody<V>>> {
    if config.bodies.is_empty() && config.cluster.is_none() {
        info!("No bodies configured, using the default three-body system.");
        return Ok(default_solar_system(factory));
    }

    let mut bodies = Vec::with_capacity(config.bodies.len());
    for (i, body) in config.bodies.iter().enumerate() {
        let created = body_from_config(body, factory)
            .with_context(|| format!("Failed to create bodies[{}]", i))?;
        debug!("Placed body {} (mass {:.3}) at {}", created.id(), created.mass, created.position);
        bodies.push(created);
    }

    if let Some(cluster) = &config.cluster {
        let placed = place_cluster(cluster, factory)?;
        info!("Placed {} cluster bodies (seed {}).", placed.len(), cluster.seed);
        bodies.extend(placed);
    }
    Ok(bodies)
}

/// A heavy central body with two light bodies orbiting it.
pub fn default_solar_system<V: Vector>(factory: &mut BodyFactory) -> Vec<CelestialBody<V>> {
    let along_x = |x: f64, y: f64| {
        let mut components = vec![0.0; V::DIM];
        components[0] = x;
        components[1] = y;
        V::from_slice(&components).unwrap_or(V::ZERO)
    };
    vec![
        factory.create(1_000_000.0, V::ZERO, V::ZERO, V::ZERO),
        factory.create(10.0, along_x(10.0, 0.0), along_x(0.0, -2.0), V::ZERO),
        factory.create(10.0, along_x(20.0, 0.0), along_x(0.0, 1.0), V::ZERO),
    ]
}

fn body_from_config<V: Vector>(body: &BodyConfig, factory: &mut BodyFactory) -> Result<CelestialBody<V>> {
    let vector = |components: Option<&Vec<f64>>, name: &str| -> Result<V> {
        match components {
            None => Ok(V::ZERO),
            Some(c) => V::from_slice(c).ok_or_else(|| {
                anyhow::anyhow!("{} has {} components, expected {}", name, c.len(), V::DIM)
            }),
        }
    };
    factory.try_create(
        body.mass,
        vector(Some(&body.position), "position")?,
        vector(body.velocity.as_ref(), "velocity")?,
        vector(body.acceleration.as_ref(), "acceleration")?,
    )
}

/// Uniform placement inside a ball of `radius`, uniform masses, and normally
/// distributed velocity components.
fn place_cluster<V: Vector>(cluster: &ClusterConfig, factory: &mut BodyFactory) -> Result<Vec<CelestialBody<V>>> {
    let mut rng = StdRng::seed_from_u64(cluster.seed);
    let unit_normal = Normal::new(0.0, 1.0)?;
    let speed_dist = Normal::new(0.0, cluster.speed_sigma)?;
    let mass_dist = Uniform::new_inclusive(cluster.mass_min, cluster.mass_max)?;
    let radius_dist = Uniform::new(0.0f64, 1.0)?;

    let mut bodies = Vec::with_capacity(cluster.count as usize);
    for _ in 0..cluster.count {
        let direction: Vec<f64> = (0..V::DIM).map(|_| rng.sample(&unit_normal)).collect();
        let direction = V::from_slice(&direction).unwrap_or(V::ZERO);
        // r ~ R * u^(1/d) gives a uniform density over the ball
        let r = cluster.radius * rng.sample(&radius_dist).powf(1.0 / V::DIM as f64);
        let position = if direction.length() > 0.0 { direction.normalize() * r } else { V::ZERO };

        let velocity: Vec<f64> = (0..V::DIM).map(|_| rng.sample(&speed_dist)).collect();
        let velocity = V::from_slice(&velocity).unwrap_or(V::ZERO);

        bodies.push(factory.try_create(rng.sample(&mass_dist), position, velocity, V::ZERO)?);
    }
    Ok(bodies)
}
