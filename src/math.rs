use crate::all::*;

// Rotation matrix to quaternion. The branch is chosen by the trace and the
// largest diagonal element so that the divisor stays away from zero.
// Matrices that are not proper rotations still produce a unit quaternion.
pub fn from_rotation_matrix(m: &Matrix3d) -> UnitQuaterniond {
  let trace = m.trace();
  let q = if trace > 0. {
    let s = 2. * (1. + trace).sqrt();
    Quaterniond::new(
      0.25 * s,
      (m[(2, 1)] - m[(1, 2)]) / s,
      (m[(0, 2)] - m[(2, 0)]) / s,
      (m[(1, 0)] - m[(0, 1)]) / s,
    )
  }
  else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
    let s = 2. * (1. + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt();
    Quaterniond::new(
      (m[(2, 1)] - m[(1, 2)]) / s,
      0.25 * s,
      (m[(0, 1)] + m[(1, 0)]) / s,
      (m[(0, 2)] + m[(2, 0)]) / s,
    )
  }
  else if m[(1, 1)] > m[(2, 2)] {
    let s = 2. * (1. + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt();
    Quaterniond::new(
      (m[(0, 2)] - m[(2, 0)]) / s,
      (m[(0, 1)] + m[(1, 0)]) / s,
      0.25 * s,
      (m[(1, 2)] + m[(2, 1)]) / s,
    )
  }
  else {
    let s = 2. * (1. + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt();
    Quaterniond::new(
      (m[(1, 0)] - m[(0, 1)]) / s,
      (m[(0, 2)] + m[(2, 0)]) / s,
      (m[(1, 2)] + m[(2, 1)]) / s,
      0.25 * s,
    )
  };
  UnitQuaterniond::new_normalize(q)
}

// q v q*, with v as a pure quaternion. Rotates v when q has unit norm.
pub fn sandwich(q: &Quaterniond, v: &Vector3d) -> Vector3d {
  let p = Quaterniond::from_imag(*v);
  (q * p * q.conjugate()).imag()
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{Rng, SeedableRng};
  use rand_xoshiro::Xoshiro256PlusPlus;

  fn random_rotation(rng: &mut Xoshiro256PlusPlus) -> UnitQuaterniond {
    let q = Quaterniond::new(
      rng.gen_range(-1. ..1.),
      rng.gen_range(-1. ..1.),
      rng.gen_range(-1. ..1.),
      rng.gen_range(-1. ..1.),
    );
    UnitQuaterniond::new_normalize(q)
  }

  // q and -q are the same rotation.
  fn same_rotation(a: &UnitQuaterniond, b: &UnitQuaterniond) -> bool {
    (a.coords - b.coords).norm().min((a.coords + b.coords).norm()) < 1e-9
  }

  #[test]
  fn test_matrix_to_quaternion() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
    for _ in 0..1000 {
      let q = random_rotation(&mut rng);
      let m = q.to_rotation_matrix().into_inner();
      let r = from_rotation_matrix(&m);
      assert!(same_rotation(&r, &q));
      assert!((r.to_rotation_matrix().into_inner() - m).norm() < 1e-9);
    }
  }

  #[test]
  fn test_matrix_to_quaternion_branches() {
    // Half turns have zero trace terms and exercise the diagonal branches.
    for axis in [Vector3d::x_axis(), Vector3d::y_axis(), Vector3d::z_axis()] {
      let q = UnitQuaterniond::from_axis_angle(&axis, std::f64::consts::PI);
      let r = from_rotation_matrix(&q.to_rotation_matrix().into_inner());
      assert!(same_rotation(&r, &q));
    }
    let r = from_rotation_matrix(&Matrix3d::identity());
    assert!(same_rotation(&r, &UnitQuaterniond::identity()));
  }

  #[test]
  fn test_degenerate_matrix() {
    for m in [Matrix3d::zeros(), 2. * Matrix3d::identity(), -Matrix3d::identity()] {
      let q = from_rotation_matrix(&m);
      assert!((q.norm() - 1.).abs() < 1e-12);
      assert!(q.coords.iter().all(|x| x.is_finite()));
    }
  }

  #[test]
  fn test_sandwich() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
    for _ in 0..100 {
      let q = random_rotation(&mut rng);
      let v = Vector3d::new(rng.gen_range(-1. ..1.), rng.gen_range(-1. ..1.), rng.gen_range(-1. ..1.));
      assert!((sandwich(q.quaternion(), &v) - q * v).norm() < 1e-12);
    }
  }
}
