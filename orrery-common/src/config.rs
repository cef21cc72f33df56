use crate::integrator::{DEFAULT_PARALLEL_THRESHOLD, G};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Physical constants for the run
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PhysicsConfig {
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_gravitational_constant")]
    pub gravitational_constant: f64,
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub dt: f64,
    pub total_time: f64,
    pub record_interval: f64,
}

// One explicitly placed body. Vector lengths must match `physics.dimensions`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BodyConfig {
    pub mass: f64,
    pub position: Vec<f64>,
    #[serde(default)]
    pub velocity: Option<Vec<f64>>,
    #[serde(default)]
    pub acceleration: Option<Vec<f64>>,
}

// Seeded random bodies appended after the explicit ones
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ClusterConfig {
    pub count: u32,
    pub seed: u64,
    pub radius: f64,
    pub mass_min: f64,
    pub mass_max: f64,
    #[serde(default)]
    pub speed_sigma: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f64; 3],
    /// Re-orthonormalize the camera frame after this many rotations.
    /// Absent means the frame is never repaired.
    #[serde(default)]
    pub reorthonormalize_interval: Option<u32>,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_positions: bool,
    pub save_stats: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

// Main scenario configuration, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    #[serde(default)]
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub cluster: Option<ClusterConfig>,
    #[serde(default)]
    pub camera: CameraConfig,
    pub output: OutputConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            dimensions: default_dimensions(),
            gravitational_constant: default_gravitational_constant(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            position: default_camera_position(),
            reorthonormalize_interval: None,
        }
    }
}

impl SimulationConfig {
    /// Loads the scenario from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file '{}'", path_ref.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config in '{}'", path_ref.display()))
    }

    /// Parses and validates a TOML scenario.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let dims = self.physics.dimensions;
        if dims != 2 && dims != 3 {
            anyhow::bail!("physics.dimensions must be 2 or 3, got {}.", dims);
        }
        let g = self.physics.gravitational_constant;
        if !g.is_finite() || g < 0.0 {
            anyhow::bail!("physics.gravitational_constant must be finite and non-negative.");
        }
        if !self.timing.dt.is_finite() || self.timing.dt <= 0.0 {
            anyhow::bail!("timing.dt must be positive.");
        }
        if !self.timing.total_time.is_finite() || self.timing.total_time < 0.0 {
            anyhow::bail!("timing.total_time must be non-negative.");
        }
        if !self.timing.record_interval.is_finite() {
            anyhow::bail!("timing.record_interval must be finite.");
        }
        if self.step_ratio().ceil() > u32::MAX as f64 {
            anyhow::bail!(
                "timing.total_time / timing.dt needs more than {} steps.",
                u32::MAX
            );
        }

        for (i, body) in self.bodies.iter().enumerate() {
            if !body.mass.is_finite() || body.mass <= 0.0 {
                anyhow::bail!("bodies[{}].mass must be positive, got {}.", i, body.mass);
            }
            let vectors = [
                ("position", Some(&body.position)),
                ("velocity", body.velocity.as_ref()),
                ("acceleration", body.acceleration.as_ref()),
            ];
            for (name, components) in vectors {
                let Some(components) = components else { continue };
                if components.len() != dims {
                    anyhow::bail!(
                        "bodies[{}].{} has {} components, expected {}.",
                        i, name, components.len(), dims
                    );
                }
                if components.iter().any(|c| !c.is_finite()) {
                    anyhow::bail!("bodies[{}].{} must be finite.", i, name);
                }
            }
        }

        if let Some(cluster) = &self.cluster {
            if cluster.radius <= 0.0 {
                anyhow::bail!("cluster.radius must be positive.");
            }
            if cluster.mass_min <= 0.0 || cluster.mass_max < cluster.mass_min {
                anyhow::bail!("cluster masses must satisfy 0 < mass_min <= mass_max.");
            }
            if !cluster.speed_sigma.is_finite() || cluster.speed_sigma < 0.0 {
                anyhow::bail!("cluster.speed_sigma must be finite and non-negative.");
            }
        }

        if self.camera.reorthonormalize_interval == Some(0) {
            anyhow::bail!("camera.reorthonormalize_interval must be at least 1 when set.");
        }
        Ok(())
    }

    /// Number of ticks needed to cover `total_time`.
    pub fn total_steps(&self) -> u32 {
        self.step_ratio().ceil() as u32
    }

    // total_time / dt, nudged down so rounding noise like 1.1 / 0.1 =
    // 11.000000000000002 does not add a tick
    fn step_ratio(&self) -> f64 {
        let ratio = self.timing.total_time / self.timing.dt;
        ratio - ratio.abs() * STEP_RATIO_TOLERANCE
    }

    /// Ticks between recorded snapshots; at least one.
    pub fn record_interval_steps(&self) -> u32 {
        ((self.timing.record_interval.max(0.0) / self.timing.dt).round() as u32).max(1)
    }
}

const STEP_RATIO_TOLERANCE: f64 = 1e-12;

fn default_dimensions() -> usize {
    3
}

fn default_gravitational_constant() -> f64 {
    G
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

fn default_camera_position() -> [f64; 3] {
    [-2.0, -2.0, -2.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [timing]
        dt = 0.01
        total_time = 1.0
        record_interval = 0.1

        [output]
        base_filename = "run"
        save_positions = true
        save_stats = true
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = SimulationConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.physics.dimensions, 3);
        assert_eq!(config.physics.gravitational_constant, G);
        assert!(config.bodies.is_empty());
        assert_eq!(config.camera.position, [-2.0, -2.0, -2.0]);
        assert_eq!(config.total_steps(), 100);
        assert_eq!(config.record_interval_steps(), 10);
    }

    #[test]
    fn parses_bodies_and_cluster() {
        let text = format!(
            r#"
            [physics]
            dimensions = 2
            gravitational_constant = 0.5

            [[bodies]]
            mass = 100.0
            position = [0.0, 0.0]

            [[bodies]]
            mass = 1.0
            position = [5.0, 0.0]
            velocity = [0.0, 3.0]

            [cluster]
            count = 12
            seed = 7
            radius = 40.0
            mass_min = 1.0
            mass_max = 2.0
            {MINIMAL}
            "#
        );
        let config = SimulationConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.bodies.len(), 2);
        assert_eq!(config.bodies[1].velocity, Some(vec![0.0, 3.0]));
        assert_eq!(config.cluster.as_ref().unwrap().count, 12);
    }

    #[test]
    fn rejects_wrong_vector_length() {
        let text = format!(
            "[[bodies]]\nmass = 1.0\nposition = [1.0, 2.0]\n{MINIMAL}"
        );
        let err = SimulationConfig::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("expected 3"), "{err}");
    }

    #[test]
    fn rejects_non_positive_mass_and_dt() {
        let text = format!("[[bodies]]\nmass = 0.0\nposition = [1.0, 2.0, 3.0]\n{MINIMAL}");
        assert!(SimulationConfig::from_toml_str(&text).is_err());

        let bad_dt = MINIMAL.replace("dt = 0.01", "dt = 0.0");
        assert!(SimulationConfig::from_toml_str(&bad_dt).is_err());
    }

    #[test]
    fn step_count_ignores_rounding_noise() {
        let text = MINIMAL.replace("dt = 0.01", "dt = 0.1").replace("total_time = 1.0", "total_time = 1.1");
        let config = SimulationConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.total_steps(), 11);

        let partial = MINIMAL.replace("total_time = 1.0", "total_time = 1.005");
        assert_eq!(SimulationConfig::from_toml_str(&partial).unwrap().total_steps(), 101);

        let empty = MINIMAL.replace("total_time = 1.0", "total_time = 0.0");
        assert_eq!(SimulationConfig::from_toml_str(&empty).unwrap().total_steps(), 0);
    }

    #[test]
    fn rejects_step_counts_beyond_u32() {
        let text = MINIMAL.replace("total_time = 1.0", "total_time = 1e12");
        let err = SimulationConfig::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("steps"), "{err}");
    }

    #[test]
    fn rejects_unknown_dimensions() {
        let text = format!("[physics]\ndimensions = 4\n{MINIMAL}");
        assert!(SimulationConfig::from_toml_str(&text).is_err());
    }
}
