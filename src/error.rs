use crate::all::*;

// Conditions that callers may want to tell apart. Only calibration failures
// are fatal, the rest are reported and recovered from where they happen.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
  // `camera` is None when the whole calibration source is missing.
  #[error("Calibration {} is unavailable: {reason}", describe_camera(.camera))]
  CalibrationUnavailable {
    camera: Option<(SensorType, usize)>,
    reason: String,
  },

  #[error("Distortion solve did not converge in {iterations} iterations (residual {residual:.2e}, estimate ({x}, {y})).", x = .estimate[0], y = .estimate[1])]
  DistortionSolveDidNotConverge {
    iterations: usize,
    residual: f64,
    estimate: Vector2d,
  },

  #[error("Rotation matrix is not a proper rotation (determinant {determinant}).")]
  DegenerateRotationInput {
    determinant: f64,
  },

  #[error("Distortion model {0:?} is not supported.")]
  UnsupportedDistortionModel(DistortionModel),

  #[error("Mesh resolution must be at least 1.")]
  InvalidMeshResolution,
}

fn describe_camera(camera: &Option<(SensorType, usize)>) -> String {
  match camera {
    Some((sensor, index)) => format!("for {:?} camera {}", sensor, index),
    None => "source".to_string(),
  }
}
