// Pinhole model with polynomial radial distortion (LINEAR, RADIAL_2 and
// RADIAL_3 calibrations). Tangential components are ignored.
//
// NOTE The Newton iteration for the inverse is based on the HybVIO
// implementation here:
//   <https://github.com/SpectacularAI/HybVIO/blob/main/src/tracker/camera.cpp>

use crate::all::*;

const UNDISTORT_MAX_ITERATIONS: usize = 20;
const UNDISTORT_CONVERGENCE_THRESHOLD: f64 = 1e-5;

pub struct PinholeModel {
  intrinsics: Intrinsics,
  distortion_coefficients: Vec<f64>,
}

impl PinholeModel {
  pub fn new(intrinsics: Intrinsics) -> Result<PinholeModel> {
    let n = match intrinsics.distortion_model {
      DistortionModel::Linear => 0,
      DistortionModel::Radial2 => 2,
      DistortionModel::Radial3 => 3,
      model => bail!("Pinhole model cannot represent {:?} distortion.", model),
    };
    if intrinsics.radial_distortion.len() < n {
      bail!("{:?} distortion needs {} coefficients, got {}.",
        intrinsics.distortion_model, n, intrinsics.radial_distortion.len());
    }
    if intrinsics.tangential_distortion.iter().any(|x| *x != 0.) {
      warn!("Ignoring tangential distortion {:?}.", intrinsics.tangential_distortion);
    }
    let distortion_coefficients = intrinsics.radial_distortion[..n].to_vec();
    Ok(PinholeModel {
      intrinsics,
      distortion_coefficients,
    })
  }

  fn distort_normalized(&self, p: Vector2d, compute_derivative: bool) -> (Vector2d, Option<Matrix2d>) {
    if self.distortion_coefficients.is_empty() {
      return (p, if compute_derivative { Some(Matrix2d::identity()) } else { None });
    }
    let c = &self.distortion_coefficients;
    let x = p[0];
    let y = p[1];
    let r2 = x * x + y * y;
    // Evaluate 1 + c0 r^2 + c1 r^4 (+ c2 r^6) and its derivative wrt r^2.
    let mut theta = 0.;
    let mut dtheta = 0.;
    for (i, k) in c.iter().enumerate().rev() {
      theta = theta * r2 + k;
      dtheta = dtheta * r2 + (i + 1) as f64 * k;
    }
    let theta = 1. + r2 * theta;
    let dp = if compute_derivative {
      Some(Matrix2d::new(
        theta + x * dtheta * 2. * x, x * dtheta * 2. * y,
        y * dtheta * 2. * x, theta + y * dtheta * 2. * y
      ))
    }
    else {
      None
    };
    (Vector2d::new(x * theta, y * theta), dp)
  }
}

impl CameraModel for PinholeModel {
  fn intrinsics(&self) -> &Intrinsics {
    &self.intrinsics
  }

  fn distort(&self, p: Vector2d) -> Vector2d {
    let (d, _) = self.distort_normalized(p, false);
    self.intrinsics.project(d)
  }

  fn undistort(&self, pixel: Vector2d) -> Solve {
    let dist = self.intrinsics.unproject(pixel);
    if self.distortion_coefficients.is_empty() {
      return Solve { point: dist, iterations: 0, residual: 0., converged: true };
    }
    let mut point = dist;
    let mut iterations = 0;
    let mut converged = false;
    while iterations < UNDISTORT_MAX_ITERATIONS {
      let (p, dp) = self.distort_normalized(point, true);
      let delta = match dp.and_then(|dp| dp.try_inverse()) {
        Some(inv) => inv * (dist - p),
        None => break,
      };
      point += delta;
      iterations += 1;
      // The step is on the normalized plane, the reported residual in pixels.
      if delta.norm() < UNDISTORT_CONVERGENCE_THRESHOLD {
        converged = true;
        break;
      }
    }
    let residual = (self.distort(point) - pixel).norm();
    Solve { point, iterations, residual, converged }
  }
}
