use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};
use orrery_common::{SimulationConfig, Snapshot, Vec2, Vec3, Vector};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

mod simulation;

use simulation::Simulation;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting orrery engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;
    info!("Loaded scenario from {}.", config_path);

    match config.physics.dimensions {
        2 => run::<Vec2>(config),
        3 => run::<Vec3>(config),
        other => anyhow::bail!("Unsupported dimensions: {}", other),
    }
}

fn run<V: Vector>(config: SimulationConfig) -> Result<()> {
    let mut sim = Simulation::<V>::new(config)?;
    debug!("Simulation config: {:#?}", sim.config());

    // --- Simulation Loop ---
    let dt = sim.config().timing.dt;
    let total_steps = sim.config().total_steps();
    let record_interval_steps = sim.config().record_interval_steps();
    if sim.config().timing.record_interval < dt {
        warn!(
            "Record interval ({:.4}) is smaller than the timestep ({:.4}). Recording every step.",
            sim.config().timing.record_interval,
            dt
        );
    }
    info!("Recording snapshot every {} steps ({:.4} time units).", record_interval_steps, record_interval_steps as f64 * dt);

    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    // --- Initial Snapshot (time = 0) ---
    sim.record_snapshot();

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        sim.step();
        let step_duration = step_start_time.elapsed();

        let current_time = Instant::now();
        let print_interval_secs = 5.0;
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step == total_steps - 1;

        if should_print_status || is_record_step || is_last_step {
            info!(
                "Step [{}/{}] (t = {:.4}) | Bodies: {} | Step Time: {:6.3} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                sim.current_time(),
                sim.body_count(),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;

            if is_record_step || is_last_step {
                sim.record_snapshot();
            }
        } else {
            trace!(
                "Step [{}/{}] completed in {:.3} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!("Simulation finished in {:.3} seconds.", total_duration.as_secs_f64());

    // --- Save Recorded Data ---
    let output = &sim.config().output;
    if output.save_stats {
        let format = output.format.as_deref().unwrap_or("json");
        if let Err(e) = save_snapshots(&output.base_filename, format, sim.get_recorded_snapshots()) {
            error!("Error saving snapshots: {:#}", e);
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if output.save_positions {
        let filename = format!("{}_final_positions.csv", output.base_filename);
        save_final_positions::<V>(&filename, &sim.get_results())?;
        info!("Final positions saved to {}", filename);
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

fn save_snapshots(base_filename: &str, format: &str, snapshots: &[Snapshot]) -> Result<()> {
    match format {
        "json" => {
            let filename = format!("{}_snapshots.json", base_filename);
            let json_string = serde_json::to_string(snapshots).context("Error serializing snapshots to JSON")?;
            let mut file = File::create(&filename).with_context(|| format!("Error creating snapshot file '{}'", filename))?;
            file.write_all(json_string.as_bytes())
                .with_context(|| format!("Error writing snapshot JSON to file '{}'", filename))?;
            info!("All snapshots saved to {} ({} KB)", filename, json_string.len() / 1024);
        }
        "bincode" => {
            let filename = format!("{}_snapshots.bin", base_filename);
            let file = File::create(&filename).with_context(|| format!("Error creating snapshot file '{}'", filename))?;
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, snapshots).context("Error serializing snapshots to bincode")?;
            writer.flush()?;
            info!("All snapshots saved to {} (binary format)", filename);
        }
        "messagepack" => {
            let filename = format!("{}_snapshots.msgpack", base_filename);
            let mut file = BufWriter::new(
                File::create(&filename).with_context(|| format!("Error creating snapshot file '{}'", filename))?,
            );
            rmp_serde::encode::write(&mut file, snapshots).context("Error serializing snapshots to MessagePack")?;
            file.flush()?;
            info!("All snapshots saved to {} (MessagePack format)", filename);
        }
        other => {
            error!("Unknown output format: {}. Using JSON instead.", other);
            save_snapshots(base_filename, "json", snapshots)?;
        }
    }
    Ok(())
}

fn save_final_positions<V: Vector>(filename: &str, positions: &[(u32, Vec<f64>)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename).with_context(|| format!("Error creating CSV file '{}'", filename))?;
    let header: Vec<&str> = ["id", "x", "y", "z"].into_iter().take(V::DIM + 1).collect();
    writer.write_record(&header)?;
    for (id, components) in positions {
        let mut record = vec![id.to_string()];
        record.extend(components.iter().map(|c| format!("{:.6}", c)));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
