use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn, LevelFilter};
use orrery_common::{Axis, BodyId, Camera, Direction, SimulationConfig, Snapshot, Vec2, Vec3, Vector, Viewport};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line arguments for the projector
#[derive(Parser, Debug)]
#[command(author, version, about = "Projects recorded orrery snapshots onto a camera screen", long_about = None)]
struct Args {
    /// Input snapshot file path (.json, .bin or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Snapshot format ("json", "bincode", "messagepack"); inferred from the extension if omitted
    #[arg(long)]
    format: Option<String>,

    /// Output CSV of projected screen positions
    #[arg(short, long, default_value = "projection.csv")]
    output: PathBuf,

    /// Optional scenario config; its [camera] section places the camera
    #[arg(long)]
    config: Option<PathBuf>,

    /// Key rotation steps about the world X axis
    #[arg(long, default_value_t = 0)]
    rotate_x: u32,

    /// Key rotation steps about the world Y axis
    #[arg(long, default_value_t = 0)]
    rotate_y: u32,

    /// Key rotation steps about the world Z axis
    #[arg(long, default_value_t = 0)]
    rotate_z: u32,

    /// Mouse-look delta "dx,dy"; may be repeated, applied in order after key rotations
    #[arg(long, value_parser = parse_look, allow_hyphen_values = true)]
    look: Vec<(f64, f64)>,

    /// Distance to move the camera along its viewing direction after rotating
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    forward: f64,

    /// Perspective scale factor in pixels
    #[arg(long, default_value_t = 200.0)]
    scale: f64,

    /// Screen width in pixels; the viewport centre is at half of it
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Screen height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,
}

/// One body's position on screen at one snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct ProjectedRow {
    time: f64,
    id: BodyId,
    screen_x: f64,
    screen_y: f64,
}

fn parse_look(s: &str) -> Result<(f64, f64), String> {
    let (dx, dy) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"dx,dy\", got '{}'", s))?;
    let dx: f64 = dx.trim().parse().map_err(|e| format!("invalid dx '{}': {}", dx, e))?;
    let dy: f64 = dy.trim().parse().map_err(|e| format!("invalid dy '{}': {}", dy, e))?;
    Ok((dx, dy))
}

fn infer_format(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "json" => Some("json"),
        "bin" => Some("bincode"),
        "msgpack" => Some("messagepack"),
        _ => None,
    }
}

fn load_snapshots<R: Read>(reader: R, format: &str) -> Result<Vec<Snapshot>> {
    let snapshots = match format {
        "json" => serde_json::from_reader(reader).context("Failed to parse JSON snapshots")?,
        "bincode" => bincode::deserialize_from(reader).context("Failed to parse bincode snapshots")?,
        "messagepack" => rmp_serde::from_read(reader).context("Failed to parse MessagePack snapshots")?,
        other => anyhow::bail!("Unknown snapshot format: {}", other),
    };
    Ok(snapshots)
}

/// Stored components as a world point; 2-D runs sit in the `z = 0` plane.
fn world_point(components: &[f64]) -> Option<Vec3> {
    match components.len() {
        2 => Vec2::from_slice(components).map(Vector::to_vec3),
        3 => Vec3::from_slice(components),
        _ => None,
    }
}

fn build_camera(args: &Args, position: Vec3, reorthonormalize_interval: Option<u32>) -> Camera {
    let mut camera = Camera::new(position).with_reorthonormalize_interval(reorthonormalize_interval);
    for (axis, count) in [(Axis::X, args.rotate_x), (Axis::Y, args.rotate_y), (Axis::Z, args.rotate_z)] {
        for _ in 0..count {
            camera.rotate_key(axis);
        }
    }
    for &(dx, dy) in &args.look {
        if !camera.look(dx, dy) {
            debug!("Ignoring zero look delta.");
        }
    }
    if args.forward != 0.0 {
        camera.move_along(Direction::Forward, args.forward);
    }
    camera
}

/// Screen rows for every body in front of the camera.
fn project_snapshot(snapshot: &Snapshot, camera: &Camera, viewport: &Viewport) -> Vec<ProjectedRow> {
    snapshot
        .bodies
        .iter()
        .filter_map(|body| {
            let point = world_point(&body.position)?;
            let screen = viewport.project(camera, point)?;
            Some(ProjectedRow {
                time: snapshot.time,
                id: body.id,
                screen_x: screen.x,
                screen_y: screen.y,
            })
        })
        .collect()
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    Builder::from_default_env().filter(None, LevelFilter::Info).try_init().ok();

    info!("Starting orrery projector...");
    info!("Input file: {}", args.input.display());
    info!("Output table: {}", args.output.display());

    // --- Camera Placement ---
    let (position, interval) = match &args.config {
        Some(config_path) => match SimulationConfig::load(config_path) {
            Ok(config) => {
                info!("Loaded camera settings from {}", config_path.display());
                let [x, y, z] = config.camera.position;
                (Vec3::new(x, y, z), config.camera.reorthonormalize_interval)
            }
            Err(e) => {
                warn!(
                    "Failed to load config file '{}': {:#}. Using the default camera.",
                    config_path.display(),
                    e
                );
                (Camera::default().position, None)
            }
        },
        None => (Camera::default().position, None),
    };
    let camera = build_camera(&args, position, interval);
    info!("Camera at {} looking along {}", camera.position, camera.basis.v3);
    debug!("Camera frame drift: {:.3e}", camera.basis.orthonormality_error());

    let viewport = Viewport {
        scale: args.scale,
        center: Vec2::new(args.width as f64 / 2.0, args.height as f64 / 2.0),
    };

    // --- Load Snapshots ---
    let format = match args.format.as_deref() {
        Some(format) => format.to_string(),
        None => infer_format(&args.input)
            .with_context(|| format!("Cannot infer snapshot format of '{}'; pass --format", args.input.display()))?
            .to_string(),
    };
    let input_file = File::open(&args.input)
        .with_context(|| format!("Failed to open input file: {}", args.input.display()))?;
    let snapshots = load_snapshots(BufReader::new(input_file), &format)?;
    info!("Found {} snapshots in the file", snapshots.len());

    if snapshots.is_empty() {
        warn!("Input file contains no snapshots. Exiting.");
        return Ok(());
    }

    // --- Project ---
    let progress_bar = ProgressBar::new(snapshots.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} snapshots ({percent}%) [{eta}]")?
            .progress_chars("#>-"),
    );

    let start_time = Instant::now();
    let projected: Vec<Vec<ProjectedRow>> = snapshots
        .par_iter()
        .map(|snapshot| {
            let rows = project_snapshot(snapshot, &camera, &viewport);
            progress_bar.inc(1);
            rows
        })
        .collect();
    progress_bar.finish_with_message("Projection complete");

    let total_bodies: usize = snapshots.iter().map(|s| s.bodies.len()).sum();
    let visible: usize = projected.iter().map(Vec::len).sum();
    info!(
        "Projected {} of {} body positions in {:.3} s ({} behind the camera).",
        visible,
        total_bodies,
        start_time.elapsed().as_secs_f64(),
        total_bodies - visible
    );

    // --- Write Output ---
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Error creating CSV file '{}'", args.output.display()))?;
    for row in projected.iter().flatten() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Output saved to: {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_common::BodyState;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["orrery-projector", "--input", "run_snapshots.json"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn snapshot(positions: &[Vec<f64>]) -> Snapshot {
        Snapshot {
            time: 1.5,
            step: 15,
            bodies: positions
                .iter()
                .enumerate()
                .map(|(i, p)| BodyState {
                    id: i as BodyId,
                    mass: 1.0,
                    position: p.clone(),
                    velocity: vec![0.0; p.len()],
                })
                .collect(),
            total_momentum: vec![0.0, 0.0, 0.0],
            kinetic_energy: 0.0,
            potential_energy: 0.0,
        }
    }

    #[test]
    fn look_deltas_parse_with_signs() {
        assert_eq!(parse_look("3,-4").unwrap(), (3.0, -4.0));
        assert_eq!(parse_look(" -0.5 , 2 ").unwrap(), (-0.5, 2.0));
        assert!(parse_look("3").is_err());
        assert!(parse_look("a,1").is_err());

        let parsed = args(&["--look", "1,0", "--look", "-2,3"]);
        assert_eq!(parsed.look, vec![(1.0, 0.0), (-2.0, 3.0)]);
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(infer_format(Path::new("a_snapshots.json")), Some("json"));
        assert_eq!(infer_format(Path::new("a_snapshots.bin")), Some("bincode"));
        assert_eq!(infer_format(Path::new("a_snapshots.msgpack")), Some("messagepack"));
        assert_eq!(infer_format(Path::new("a_snapshots")), None);
    }

    #[test]
    fn snapshots_load_from_every_format() {
        let snapshots = vec![snapshot(&[vec![1.0, 2.0, 3.0]]), snapshot(&[vec![4.0, 5.0]])];

        let json = serde_json::to_vec(&snapshots).unwrap();
        let bin = bincode::serialize(&snapshots).unwrap();
        let msgpack = rmp_serde::to_vec(&snapshots).unwrap();
        for (bytes, format) in [(json, "json"), (bin, "bincode"), (msgpack, "messagepack")] {
            let loaded = load_snapshots(bytes.as_slice(), format).unwrap();
            assert_eq!(loaded.len(), 2, "{}", format);
            assert_eq!(loaded[1].bodies[0].position, vec![4.0, 5.0]);
        }
        assert!(load_snapshots(&b"[]"[..], "yaml").is_err());
    }

    #[test]
    fn bodies_behind_the_camera_are_dropped() {
        let camera = Camera::new(Vec3::ZERO);
        let viewport = Viewport::default();
        let rows = project_snapshot(
            &snapshot(&[vec![0.0, 0.0, 5.0], vec![0.0, 0.0, -5.0], vec![1.0, -2.0, 2.0]]),
            &camera,
            &viewport,
        );
        assert_eq!(
            rows,
            vec![
                ProjectedRow { time: 1.5, id: 0, screen_x: 400.0, screen_y: 400.0 },
                ProjectedRow { time: 1.5, id: 2, screen_x: 500.0, screen_y: 200.0 },
            ]
        );
    }

    #[test]
    fn planar_runs_are_viewed_in_the_z_plane() {
        // Default camera at (-2,-2,-2) sees the z = 0 plane in front of it.
        let camera = Camera::default();
        let viewport = Viewport::default();
        let rows = project_snapshot(&snapshot(&[vec![-2.0, -2.0]]), &camera, &viewport);
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].screen_x, rows[0].screen_y), (400.0, 400.0));
        assert!(world_point(&[1.0]).is_none());
    }

    #[test]
    fn camera_options_apply_in_order() {
        // twenty steps of pi/40 is a quarter turn; the Y key carries v3 toward -x
        let quarter = build_camera(&args(&["--rotate-y", "20"]), Vec3::ZERO, None);
        assert!(quarter.basis.v3.approx_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-12));
        assert!(quarter.basis.v1.approx_eq(Vec3::new(0.0, 0.0, 1.0), 1e-12));

        let half = build_camera(&args(&["--rotate-y", "40"]), Vec3::ZERO, None);
        assert!(half.basis.v3.approx_eq(Vec3::new(0.0, 0.0, -1.0), 1e-12));

        let moved = build_camera(&args(&["--forward", "2"]), Vec3::ZERO, None);
        assert!(moved.position.approx_eq(Vec3::new(0.0, 0.0, 2.0), 1e-15));

        let still = build_camera(&args(&["--look", "0,0"]), Vec3::ZERO, None);
        assert_eq!(still.basis, Camera::new(Vec3::ZERO).basis);
    }
}
