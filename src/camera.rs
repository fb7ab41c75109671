use crate::all::*;

// Lens models the capture library can report. Only some are implemented,
// see `Camera::new()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum DistortionModel {
  #[serde(rename = "LINEAR")]
  Linear,
  #[serde(rename = "RADIAL_2")]
  Radial2,
  #[serde(rename = "RADIAL_3")]
  Radial3,
  #[serde(rename = "RADIAL_6")]
  Radial6,
  #[serde(rename = "FISHEYE_1")]
  Fisheye1,
  #[serde(rename = "FISHEYE_4")]
  Fisheye4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ArgEnum)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
  Rgb,
  Tracking,
  Handtracking,
}

// Intrinsic camera parameters as stored by the calibration library.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intrinsics {
  pub size: [usize; 2],
  pub principal_point: [f64; 2],
  pub focal_length: [f64; 2],
  #[serde(default)]
  pub skew: f64,
  // Up to 7 values, meaning depends on `distortion_model`.
  #[serde(default)]
  pub radial_distortion: Vec<f64>,
  #[serde(default)]
  pub tangential_distortion: [f64; 2],
  pub distortion_model: DistortionModel,
}

impl Intrinsics {
  pub fn width(&self) -> usize { self.size[0] }
  pub fn height(&self) -> usize { self.size[1] }

  pub fn principal_point(&self) -> Vector2d {
    Vector2d::new(self.principal_point[0], self.principal_point[1])
  }

  // Normalized image plane coordinates to pixels.
  pub fn project(&self, d: Vector2d) -> Vector2d {
    Vector2d::new(
      self.focal_length[0] * (d[0] + self.skew * d[1]) + self.principal_point[0],
      self.focal_length[1] * d[1] + self.principal_point[1],
    )
  }

  // Inverse of `project()`.
  pub fn unproject(&self, pixel: Vector2d) -> Vector2d {
    let y = (pixel[1] - self.principal_point[1]) / self.focal_length[1];
    let x = (pixel[0] - self.principal_point[0]) / self.focal_length[0] - self.skew * y;
    Vector2d::new(x, y)
  }
}

// Camera pose in the rig reference frame.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Extrinsics {
  // x, y, z, w.
  pub orientation: [f64; 4],
  pub position: [f64; 3],
}

impl Extrinsics {
  pub fn identity() -> Extrinsics {
    Extrinsics {
      orientation: [0., 0., 0., 1.],
      position: [0., 0., 0.],
    }
  }
}

// Result of an iterative inverse of a distortion model. The point is the best
// estimate even when the iteration did not converge. For every model the
// residual is the distance in pixels between the distorted estimate and the
// requested pixel.
#[derive(Clone, Copy, Debug)]
pub struct Solve {
  pub point: Vector2d,
  pub iterations: usize,
  pub residual: f64,
  pub converged: bool,
}

impl Solve {
  pub fn check(&self) -> std::result::Result<(), CaptureError> {
    if self.converged { return Ok(()) }
    Err(CaptureError::DistortionSolveDidNotConverge {
      iterations: self.iterations,
      residual: self.residual,
      estimate: self.point,
    })
  }
}

pub trait CameraModel: Send + Sync {
  fn intrinsics(&self) -> &Intrinsics;

  // Point on the z = 1 plane to distorted pixel coordinates.
  fn distort(&self, point: Vector2d) -> Vector2d;

  // Distorted pixel coordinates to a point on the z = 1 plane.
  fn undistort(&self, pixel: Vector2d) -> Solve;
}

// Intrinsic and extrinsic camera parameters for a single camera.
pub struct Camera {
  pub sensor: SensorType,
  pub index: usize,
  pub extrinsics: Extrinsics,
  pub model: Box<dyn CameraModel>,
}

impl Camera {
  pub fn new(
    sensor: SensorType,
    index: usize,
    intrinsics: Intrinsics,
    extrinsics: Extrinsics,
  ) -> Result<Camera> {
    let model: Box<dyn CameraModel> = match intrinsics.distortion_model {
      DistortionModel::Fisheye4 => Box::new(FisheyeModel::new(intrinsics)?),
      DistortionModel::Linear
        | DistortionModel::Radial2
        | DistortionModel::Radial3 => Box::new(PinholeModel::new(intrinsics)?),
      model @ (DistortionModel::Radial6 | DistortionModel::Fisheye1) => {
        return Err(CaptureError::UnsupportedDistortionModel(model).into());
      },
    };
    Ok(Camera {
      sensor,
      index,
      extrinsics,
      model,
    })
  }

  pub fn intrinsics(&self) -> &Intrinsics {
    self.model.intrinsics()
  }
}
