use anyhow::Result;
use log::{debug, info, warn};
use orrery_common::scenario::build_bodies;
use orrery_common::{BodyFactory, CelestialBody, Gravity, SimulationConfig, Snapshot, Vector};

/// Owns the body set for one run and steps it with a fixed `dt`.
pub struct Simulation<V: Vector> {
    /// The scenario configuration the run was built from.
    config: SimulationConfig,
    /// Bodies in creation order.
    bodies: Vec<CelestialBody<V>>,
    /// Force law with the run's gravitational constant.
    gravity: Gravity,
    /// Id source for every body in this run.
    factory: BodyFactory,
    /// Number of ticks completed.
    pub current_time_step: u32,
    /// Stores collected snapshots at record intervals.
    recorded_snapshots: Vec<Snapshot>,
}

impl<V: Vector> Simulation<V> {
    /// Creates a new `Simulation`, building the initial bodies from the config.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        if config.physics.dimensions != V::DIM {
            anyhow::bail!(
                "Config asks for {} dimensions but the simulation was built for {}.",
                config.physics.dimensions,
                V::DIM
            );
        }
        let mut factory = BodyFactory::new();
        let bodies = build_bodies::<V>(&config, &mut factory)?;
        if bodies.is_empty() {
            anyhow::bail!("Scenario produced no bodies.");
        }
        let gravity = Gravity::new(config.physics.gravitational_constant)
            .with_parallel_threshold(config.physics.parallel_threshold);

        info!(
            "Built {}-D scenario with {} bodies (G = {}).",
            V::DIM,
            bodies.len(),
            gravity.constant()
        );
        for body in &bodies {
            debug!("Initial state:\n{}", body);
        }

        Ok(Self {
            config,
            bodies,
            gravity,
            factory,
            current_time_step: 0,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Advances the simulation by one tick of `timing.dt`.
    pub fn step(&mut self) {
        self.gravity.advance(&mut self.bodies, self.config.timing.dt);
        self.current_time_step += 1;
    }

    /// Adds a body mid-run. It feels gravity from the next tick on and keeps
    /// the acceleration it was given until then.
    pub fn add_body(&mut self, mass: f64, position: V, velocity: V, acceleration: V) -> Result<&CelestialBody<V>> {
        let body = self.factory.try_create(mass, position, velocity, acceleration)?;
        info!("Added body {} at step {}.", body.id(), self.current_time_step);
        self.bodies.push(body);
        Ok(&self.bodies[self.bodies.len() - 1])
    }

    /// Simulation time reached so far.
    pub fn current_time(&self) -> f64 {
        self.current_time_step as f64 * self.config.timing.dt
    }

    /// Records diagnostics for the current state.
    pub fn record_snapshot(&mut self) {
        let time = self.current_time();
        debug!("Recording snapshot at t = {:.4}...", time);

        let degenerate = self.bodies.iter().filter(|b| b.is_degenerate()).count();
        if degenerate > 0 {
            warn!(
                "{} of {} bodies have non-finite state at t = {:.4} (coincident bodies?).",
                degenerate,
                self.bodies.len(),
                time
            );
        }

        let snapshot = Snapshot::capture(time, self.current_time_step, &self.bodies, &self.gravity);
        debug!(
            "Energy: kinetic = {:.6e}, potential = {:.6e}, total = {:.6e}",
            snapshot.kinetic_energy,
            snapshot.potential_energy,
            snapshot.total_energy()
        );
        self.recorded_snapshots.push(snapshot);
    }

    /// Provides access to the recorded snapshots.
    pub fn get_recorded_snapshots(&self) -> &Vec<Snapshot> {
        &self.recorded_snapshots
    }

    /// Final `(id, position components)` rows.
    pub fn get_results(&self) -> Vec<(u32, Vec<f64>)> {
        self.bodies.iter().map(|b| (b.id(), b.position.to_vec())).collect()
    }

    pub fn bodies(&self) -> &[CelestialBody<V>] {
        &self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
