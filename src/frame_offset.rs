use crate::all::*;

// Rigid transform mapping points of one frame into another:
//   x_target = rotation * x_source + translation.
// Derived once per camera and reused for every detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameOffset {
  pub rotation: UnitQuaterniond,
  pub translation: Vector3d,
}

impl FrameOffset {
  pub fn identity() -> FrameOffset {
    FrameOffset {
      rotation: UnitQuaterniond::identity(),
      translation: Vector3d::zeros(),
    }
  }

  pub fn from_translation(translation: Vector3d) -> FrameOffset {
    FrameOffset {
      rotation: UnitQuaterniond::identity(),
      translation,
    }
  }

  // Offset from a camera's optical frame into the frame its extrinsics are
  // expressed in (IMU or head center). The extrinsic orientation `q` and
  // position `p` give:
  //   rotation = conj(q),  translation = -(q p conj(q)).
  // The position is rotated with `q` itself, not its conjugate. This is the
  // convention of the calibration data the offsets are used with.
  pub fn from_extrinsics(extrinsics: &Extrinsics) -> FrameOffset {
    let q = extrinsic_orientation(extrinsics);
    let p = extrinsic_position(extrinsics);
    FrameOffset {
      rotation: UnitQuaterniond::new_unchecked(q.conjugate()),
      translation: -sandwich(&q, &p),
    }
  }

  pub fn apply(&self, x: &Vector3d) -> Vector3d {
    self.rotation * x + self.translation
  }

  // Offset that applies `self` and then `next`.
  pub fn then(&self, next: &FrameOffset) -> FrameOffset {
    FrameOffset {
      rotation: next.rotation * self.rotation,
      translation: next.rotation * self.translation + next.translation,
    }
  }
}

// Normalized extrinsic orientation. Zero quaternions become identity.
pub fn extrinsic_orientation(extrinsics: &Extrinsics) -> Quaterniond {
  let q = quaternion_from_xyzw(extrinsics.orientation);
  if q.norm() > 0. {
    q.normalize()
  }
  else {
    warn!("Zero extrinsic orientation, using identity.");
    Quaterniond::identity()
  }
}

pub fn extrinsic_position(extrinsics: &Extrinsics) -> Vector3d {
  Vector3d::new(extrinsics.position[0], extrinsics.position[1], extrinsics.position[2])
}
