use crate::all::*;

// Source of per-camera calibration. On the device this is the capture
// library, which only answers while the camera is running.
pub trait CalibrationStore {
  fn read_camera_parameters(
    &self,
    sensor: SensorType,
    index: usize,
  ) -> std::result::Result<(Intrinsics, Extrinsics), CaptureError>;
}

#[derive(Deserialize)]
struct CameraSetup {
  sensor: SensorType,
  index: usize,
  intrinsics: Intrinsics,
  // Cameras without extrinsics define the reference frame.
  #[serde(default = "Extrinsics::identity")]
  extrinsics: Extrinsics,
}

#[derive(Deserialize)]
struct CameraSetupRoot {
  cameras: Vec<CameraSetup>,
}

const MAX_PARENT_DIRECTORY_HEIGHT: usize = 1;
const SETUP_FILE_NAME: &'static str = "calibration.json";

// Calibration dumped to a JSON file.
pub struct JsonCalibrationStore {
  cameras: Vec<CameraSetup>,
}

impl JsonCalibrationStore {
  // `path` is either the calibration file or a directory containing it
  // (or whose parent contains it).
  pub fn load(path: &Path) -> Result<JsonCalibrationStore> {
    if path.is_file() {
      return parse_setup(path);
    }
    for dir in path.ancestors().take(MAX_PARENT_DIRECTORY_HEIGHT + 1) {
      let setup_path = dir.join(SETUP_FILE_NAME);
      if setup_path.exists() {
        return parse_setup(&setup_path);
      }
    }
    Err(CaptureError::CalibrationUnavailable {
      camera: None,
      reason: format!("no {} in {}", SETUP_FILE_NAME, path.display()),
    }.into())
  }

  pub fn parse(s: &str) -> Result<JsonCalibrationStore> {
    let root: CameraSetupRoot = serde_json::from_str(s)?;
    Ok(JsonCalibrationStore {
      cameras: root.cameras,
    })
  }
}

impl CalibrationStore for JsonCalibrationStore {
  fn read_camera_parameters(
    &self,
    sensor: SensorType,
    index: usize,
  ) -> std::result::Result<(Intrinsics, Extrinsics), CaptureError> {
    self.cameras.iter()
      .find(|c| c.sensor == sensor && c.index == index)
      .map(|c| (c.intrinsics.clone(), c.extrinsics.clone()))
      .ok_or(CaptureError::CalibrationUnavailable {
        camera: Some((sensor, index)),
        reason: "no such camera in the calibration file".to_string(),
      })
  }
}

fn parse_setup(path: &Path) -> Result<JsonCalibrationStore> {
  let s = std::fs::read_to_string(path)
    .map_err(|err| CaptureError::CalibrationUnavailable {
      camera: None,
      reason: format!("cannot read {}: {}", path.display(), err),
    })?;
  JsonCalibrationStore::parse(&s)
    .context(format!("Failed to parse {}.", path.display()))
}

impl Camera {
  pub fn load(store: &dyn CalibrationStore, sensor: SensorType, index: usize) -> Result<Camera> {
    let (intrinsics, extrinsics) = store.read_camera_parameters(sensor, index)?;
    info!("{:?} camera {}: {}x{}, {:?} model.", sensor, index,
      intrinsics.width(), intrinsics.height(), intrinsics.distortion_model);
    Camera::new(sensor, index, intrinsics, extrinsics)
      .context(format!("Invalid calibration for {:?} camera {}.", sensor, index))
  }
}
