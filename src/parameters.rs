use crate::all::*;

use clap::Parser;

// Mechanical offset from the IMU to the head center, in meters, expressed in
// the IMU frame. Depends on the hardware revision.
pub const DEFAULT_HEAD_CENTER_OFFSET: &str = "0.001,0.010,-0.011";

lazy_static! {
  pub static ref PARAMETER_SET: Mutex<ParameterSet> = Mutex::new(ParameterSet::default());
}

#[derive(Clone, Debug)]
#[derive(clap::Parser)]
pub struct ParameterSet {
  // Cameras.
  #[clap(long, arg_enum, default_value = "rgb")]
  pub sensor: SensorType,
  #[clap(long, default_value = "2")]
  pub camera_count: usize,
  // Camera whose frames go to the marker detector.
  #[clap(long, default_value = "0")]
  pub tracking_camera: usize,

  // Undistortion mesh cells per side.
  #[clap(long, default_value = "50")]
  pub mesh_resolution: usize,

  // Pose conversion.
  #[clap(long, default_value = DEFAULT_HEAD_CENTER_OFFSET, parse(try_from_str = parse_vector3))]
  pub head_center_offset: Vector3d,
  #[clap(long, arg_enum, default_value = "rigid")]
  pub composition: Composition,
  #[clap(long, arg_enum, default_value = "y")]
  pub flip_axis: Axis,
}

impl Default for ParameterSet {
  fn default() -> ParameterSet {
    ParameterSet::parse_from([env!("CARGO_PKG_NAME")])
  }
}

impl ParameterSet {
  pub fn convention(&self) -> Convention {
    Convention {
      composition: self.composition,
      flip_axis: self.flip_axis,
    }
  }
}

fn parse_vector3(s: &str) -> std::result::Result<Vector3d, String> {
  let v = s.split(',')
    .map(|x| x.trim().parse::<f64>().map_err(|err| format!("{}: {}", x, err)))
    .collect::<std::result::Result<Vec<_>, _>>()?;
  if v.len() != 3 {
    return Err(format!("Expected three comma separated values, got {}.", v.len()));
  }
  Ok(Vector3d::new(v[0], v[1], v[2]))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let p = ParameterSet::default();
    assert_eq!(p.sensor, SensorType::Rgb);
    assert_eq!(p.mesh_resolution, 50);
    assert_eq!(p.head_center_offset, Vector3d::new(0.001, 0.010, -0.011));
    assert_eq!(p.convention(), Convention::default());
  }

  #[test]
  fn test_overrides() {
    let p = ParameterSet::parse_from([
      "capture-pose",
      "--head-center-offset", "0, 0.02,0",
      "--composition", "additive",
      "--flip-axis", "z",
      "--mesh-resolution", "8",
    ]);
    assert_eq!(p.head_center_offset, Vector3d::new(0., 0.02, 0.));
    assert_eq!(p.composition, Composition::Additive);
    assert_eq!(p.flip_axis, Axis::Z);
    assert_eq!(p.mesh_resolution, 8);
    assert!(ParameterSet::try_parse_from(["capture-pose", "--head-center-offset", "1,2"]).is_err());
  }
}
