mod all;
mod camera;
mod camera_fisheye;
mod camera_pinhole;
mod camera_setup;
mod capture;
mod detector;
mod error;
mod frame;
mod frame_offset;
mod head_pose;
mod input;
mod math;
mod mesh;
mod parameters;
mod pose;
mod pose_slot;
mod tracker;
mod types;
mod util;

use all::*;

#[macro_use] extern crate lazy_static;
use clap::Parser;

use std::time::Duration;

// How long the consumer waits for a pose before checking again, roughly one
// display frame.
const CONSUMER_FRAME_PERIOD: Duration = Duration::from_millis(16);

#[derive(Parser)]
struct Args {
  // Recorded capture session, JSON lines.
  #[clap(short, long)]
  input: PathBuf,
  // Calibration file or a directory containing `calibration.json`. Defaults
  // to the directory of the input.
  #[clap(short, long)]
  calibration: Option<PathBuf>,
  // Write the undistortion meshes of all cameras here as JSON.
  #[clap(long)]
  mesh_output: Option<PathBuf>,
  #[clap(long, default_value = "info")]
  log_level: LevelFilter,
  #[clap(flatten)]
  parameters: ParameterSet,
}

#[derive(Serialize)]
struct CameraMesh<'a> {
  sensor: SensorType,
  index: usize,
  plane: PlanePose,
  mesh: &'a UndistortMesh,
}

fn handle_error(err: &anyhow::Error) {
  for (i, e) in err.chain().enumerate() {
    eprintln!("  {}: {}", i + 1, e);
  }
}

fn main() {
  if let Err(err) = run() {
    handle_error(&err);
    std::process::exit(1);
  }
}

fn run() -> Result<()> {
  let args = Args::parse();

  env_logger::Builder::new()
    .filter_level(args.log_level)
    .format(util::format_log)
    .init();

  *PARAMETER_SET.lock().unwrap() = args.parameters.clone();
  let p = &args.parameters;

  let calibration_path = match &args.calibration {
    Some(path) => path.clone(),
    None => args.input.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
  };
  let store = JsonCalibrationStore::load(&calibration_path)?;
  let cameras = (0..p.camera_count)
    .map(|index| Camera::load(&store, p.sensor, index))
    .collect::<Result<Vec<_>>>()
    .context("Cannot start without calibration.")?;

  let meshes = cameras.iter()
    .map(|camera| -> Result<UndistortMesh> {
      let mesh = UndistortMesh::build(
        camera.model.as_ref(),
        CameraSide::from_index(camera.index),
        p.mesh_resolution,
      )?;
      info!("Camera {} mesh: {} vertices, {} triangles.",
        camera.index, mesh.vertices.len(), mesh.triangle_count());
      Ok(mesh)
    })
    .collect::<Result<Vec<_>>>()?;
  if let Some(path) = &args.mesh_output {
    write_meshes(path, &cameras, &meshes)?;
  }

  let camera = cameras.get(p.tracking_camera)
    .ok_or(anyhow!("Tracking camera {} is not among the {} cameras.", p.tracking_camera, cameras.len()))?;
  let tracker = Tracker::new(camera, Box::new(RecordedDetector));
  let input = Input::new(&args.input)?;
  let (sender, receiver) = pose_slot();
  let handle = spawn_capture(input, tracker, sender)?;

  // Consumer side: apply the latest pose once per display frame.
  let stdout = std::io::stdout();
  let mut out = stdout.lock();
  let mut consumed = 0;
  while let Ok(pose) = receiver.wait(CONSUMER_FRAME_PERIOD) {
    if let Some(pose) = pose {
      serde_json::to_writer(&mut out, &pose)?;
      writeln!(out)?;
      consumed += 1;
    }
  }

  let stats = join_capture(handle)?;
  info!("{} frames, {} detections, {} poses consumed, {} superseded.",
    stats.frames, stats.detections, consumed, stats.superseded);
  Ok(())
}

fn write_meshes(path: &Path, cameras: &[Camera], meshes: &[UndistortMesh]) -> Result<()> {
  let output: Vec<CameraMesh> = cameras.iter().zip(meshes)
    .map(|(camera, mesh)| CameraMesh {
      sensor: camera.sensor,
      index: camera.index,
      plane: PlanePose::from_extrinsics(&camera.extrinsics),
      mesh,
    })
    .collect();
  let file = File::create(path)
    .context(format!("Failed to create {}.", path.display()))?;
  serde_json::to_writer(BufWriter::new(file), &output)
    .context(format!("Failed to write meshes to {}.", path.display()))?;
  info!("Wrote meshes to {}.", path.display());
  Ok(())
}
