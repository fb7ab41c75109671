// Field-angle ("fisheye", Kannala-Brandt style) lens model with four
// coefficients. Distortion is a polynomial in the incidence angle
// theta = atan(r) rather than in the radius r itself.
//
// The inverse has no closed form. It is solved by one bisection per axis:
// first y with x fixed to zero, then x with y fixed to that solution. The two
// axes are not solved jointly, so the result is only accurate near the image
// axes and the optical center. That is good enough for building the
// undistortion mesh, whose extremes lie exactly on the axes.

use crate::all::*;

const FISHEYE_COEFFICIENT_COUNT: usize = 4;

// Stopping criterion in pixels. Pixels this close to the principal point are
// searched within the same half-width on the normalized plane.
const SOLVE_TOLERANCE: f64 = 1e-3;
// Outer end of the search bracket on the normalized image plane.
const BRACKET_LIMIT: f64 = 10.;
const MAX_BISECTION_ITERATIONS: usize = 100;

// Below this radius theta_d / r is replaced by its limit 1.
const MIN_RADIUS: f64 = 1e-12;

pub struct FisheyeModel {
  intrinsics: Intrinsics,
  coefficients: [f64; FISHEYE_COEFFICIENT_COUNT],
}

struct Bisection {
  value: f64,
  iterations: usize,
  converged: bool,
}

impl FisheyeModel {
  pub fn new(intrinsics: Intrinsics) -> Result<FisheyeModel> {
    let c = &intrinsics.radial_distortion;
    if c.len() < FISHEYE_COEFFICIENT_COUNT {
      bail!("Fisheye model needs {} distortion coefficients, got {}.",
        FISHEYE_COEFFICIENT_COUNT, c.len());
    }
    let coefficients = [c[0], c[1], c[2], c[3]];
    Ok(FisheyeModel {
      intrinsics,
      coefficients,
    })
  }

  // Distorted radius divided by the undistorted one.
  fn radial_scale(&self, r: f64) -> f64 {
    if r < MIN_RADIUS { return 1. }
    let k = &self.coefficients;
    let theta = r.atan();
    let theta2 = theta * theta;
    let theta_d = theta * (1. + theta2 * (k[0] + theta2 * (k[1] + theta2 * (k[2] + theta2 * k[3]))));
    theta_d / r
  }
}

impl CameraModel for FisheyeModel {
  fn intrinsics(&self) -> &Intrinsics {
    &self.intrinsics
  }

  fn distort(&self, p: Vector2d) -> Vector2d {
    let d = self.radial_scale(p.norm()) * p;
    self.intrinsics.project(d)
  }

  fn undistort(&self, pixel: Vector2d) -> Solve {
    let center = self.intrinsics.principal_point();
    let y = bisect(
      |y| self.distort(Vector2d::new(0., y))[1],
      pixel[1],
      bracket(pixel[1] - center[1]),
    );
    let x = bisect(
      |x| self.distort(Vector2d::new(x, y.value))[0],
      pixel[0],
      bracket(pixel[0] - center[0]),
    );
    let point = Vector2d::new(x.value, y.value);
    Solve {
      point,
      iterations: x.iterations + y.iterations,
      residual: (self.distort(point) - pixel).norm(),
      converged: x.converged && y.converged,
    }
  }
}

// `offset` is the pixel distance from the principal point along one axis.
// The one-sided brackets reach zero because a pixel offset above the
// tolerance can still be far below it on the normalized plane.
fn bracket(offset: f64) -> [f64; 2] {
  if offset > SOLVE_TOLERANCE {
    [0., BRACKET_LIMIT]
  }
  else if offset < -SOLVE_TOLERANCE {
    [-BRACKET_LIMIT, 0.]
  }
  else {
    [-SOLVE_TOLERANCE, SOLVE_TOLERANCE]
  }
}

// Assumes `f` is increasing inside `range`.
fn bisect<F: Fn(f64) -> f64>(f: F, target: f64, mut range: [f64; 2]) -> Bisection {
  for i in 0..MAX_BISECTION_ITERATIONS {
    let value = 0.5 * (range[0] + range[1]);
    let out = f(value);
    if out > target { range[1] = value } else { range[0] = value }
    if (out - target).abs() <= SOLVE_TOLERANCE {
      return Bisection { value, iterations: i + 1, converged: true };
    }
  }
  Bisection {
    value: 0.5 * (range[0] + range[1]),
    iterations: MAX_BISECTION_ITERATIONS,
    converged: false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{Rng, SeedableRng};
  use rand_xoshiro::Xoshiro256PlusPlus;

  fn model(coefficients: [f64; 4]) -> FisheyeModel {
    FisheyeModel::new(Intrinsics {
      size: [1536, 1404],
      principal_point: [768., 702.],
      focal_length: [500., 500.],
      skew: 0.,
      radial_distortion: coefficients.to_vec(),
      tangential_distortion: [0., 0.],
      distortion_model: DistortionModel::Fisheye4,
    }).unwrap()
  }

  #[test]
  fn test_center_maps_to_principal_point() {
    for k in [[0., 0., 0., 0.], [0.3, -0.1, 0.05, -0.01], [-0.0138, 0.0163, -0.0101, 0.0021]] {
      let camera = model(k);
      assert_eq!(camera.distort(Vector2d::zeros()), Vector2d::new(768., 702.));
    }
  }

  #[test]
  fn test_equidistant() {
    // Without coefficients the model is the equidistant projection r_d = atan(r).
    let camera = model([0., 0., 0., 0.]);
    let r = 0.02_f64.sqrt();
    let s = r.atan() / r;
    let pixel = camera.distort(Vector2d::new(0.1, 0.1));
    let expected = Vector2d::new(768. + 500. * 0.1 * s, 702. + 500. * 0.1 * s);
    assert!((pixel - expected).norm() < 1e-9);

    let solve = camera.undistort(pixel);
    assert!(solve.converged);
    assert!((solve.point - Vector2d::new(0.1, 0.1)).norm() < 1e-2);
  }

  #[test]
  fn test_round_trip_on_axes() {
    let camera = model([-0.0138, 0.0163, -0.0101, 0.0021]);
    for i in -20..=20 {
      let v = i as f64 * 0.1;
      for p in [Vector2d::new(v, 0.), Vector2d::new(0., v)] {
        let solve = camera.undistort(camera.distort(p));
        assert!(solve.check().is_ok());
        assert!((solve.point - p).norm() < 1e-2, "{} -> {}", p, solve.point);
      }
    }
  }

  #[test]
  fn test_round_trip_near_center() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    for _ in 0..20 {
      let mut k = [0.; 4];
      for c in k.iter_mut() { *c = rng.gen_range(-0.01..0.01) }
      let camera = model(k);
      for _ in 0..50 {
        let angle = rng.gen_range(0. ..std::f64::consts::TAU);
        let r = rng.gen_range(0. ..0.3);
        let p = r * Vector2d::new(angle.cos(), angle.sin());
        let solve = camera.undistort(camera.distort(p));
        assert!(solve.converged);
        assert!((solve.point - p).norm() < 1e-2, "{} -> {}", p, solve.point);
      }
    }
  }

  #[test]
  fn test_subpixel_offset_from_axis() {
    // x is 0.2 px from the principal point, well inside 1e-3 on the normalized plane.
    let camera = model([0., 0., 0., 0.]);
    let p = Vector2d::new(0.0004, 0.2);
    let pixel = camera.distort(p);
    assert!(pixel[0] - 768. > SOLVE_TOLERANCE);
    let solve = camera.undistort(pixel);
    assert!(solve.check().is_ok());
    // Each axis is within the tolerance.
    assert!(solve.residual < 2. * SOLVE_TOLERANCE);
    assert!((solve.point - p).norm() < 1e-5, "{} -> {}", p, solve.point);

    let solve = camera.undistort(camera.distort(Vector2d::new(-0.0004, -0.2)));
    assert!(solve.converged);
    assert!((solve.point - Vector2d::new(-0.0004, -0.2)).norm() < 1e-5);
  }

  #[test]
  fn test_unreachable_pixel_is_capped() {
    let camera = model([0., 0., 0., 0.]);
    let solve = camera.undistort(Vector2d::new(768. + 1e6, 702.));
    assert!(!solve.converged);
    assert!(solve.iterations > MAX_BISECTION_ITERATIONS);
    // Best estimate is pushed against the bracket end.
    assert!((solve.point[0] - BRACKET_LIMIT).abs() < 1e-6);
    assert!(matches!(
      solve.check(),
      Err(CaptureError::DistortionSolveDidNotConverge { .. })
    ));
  }

  #[test]
  fn test_too_few_coefficients() {
    let mut i = model([0.; 4]).intrinsics.clone();
    i.radial_distortion = vec![0.1];
    assert!(FisheyeModel::new(i).is_err());
  }
}
