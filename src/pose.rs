// Conversion of marker detections from a camera's optical frame into the
// consumer's coordinate system.
//
// The detector reports poses in the OpenCV camera convention (x right,
// y down, z forward). A detection goes through these steps:
//   1. rotation matrix to quaternion,
//   2-3. composition with the camera frame offset and the fixed head-center
//      offset,
//   4. mirroring of one axis into the consumer's handedness,
//   5. placement in the consumer's reference frame (the tracked head).
//
// Historical calibrations disagree on the composition order and on the
// mirrored axis, so both are part of `Convention`. The default is locked by
// `test_default_convention`.

use crate::all::*;

// Maximum deviation of the determinant from 1 before an input rotation is
// reported as degenerate.
const ROTATION_DETERMINANT_TOLERANCE: f64 = 1e-3;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawMarkerPose {
  // Row-major.
  pub rotation: [f64; 9],
  pub translation: [f64; 3],
}

impl RawMarkerPose {
  pub fn rotation_matrix(&self) -> Matrix3d {
    Matrix3d::from_row_slice(&self.rotation)
  }

  pub fn translation(&self) -> Vector3d {
    Vector3d::new(self.translation[0], self.translation[1], self.translation[2])
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ArgEnum)]
pub enum Composition {
  // Detection first, then the offset, as rigid transforms:
  //   R' = R_o R,  t' = R_o t + t_o.
  Rigid,
  // Orientation right-multiplied by the offset, translations summed:
  //   R' = R R_o,  t' = t + t_o.
  Additive,
}

impl Composition {
  // Single offset equivalent to composing with `first` and then `second`.
  pub fn chain(self, first: &FrameOffset, second: &FrameOffset) -> FrameOffset {
    match self {
      Composition::Rigid => first.then(second),
      Composition::Additive => FrameOffset {
        rotation: first.rotation * second.rotation,
        translation: first.translation + second.translation,
      },
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ArgEnum)]
pub enum Axis {
  X,
  Y,
  Z,
}

impl Axis {
  pub fn index(self) -> usize {
    match self {
      Axis::X => 0,
      Axis::Y => 1,
      Axis::Z => 2,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Convention {
  pub composition: Composition,
  // Axis mirrored when going from the camera convention to the consumer's.
  pub flip_axis: Axis,
}

impl Default for Convention {
  fn default() -> Convention {
    Convention {
      composition: Composition::Rigid,
      flip_axis: Axis::Y,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
  pub position: Vector3d,
  pub orientation: UnitQuaterniond,
}

impl Pose {
  pub fn from_raw(raw: &RawMarkerPose) -> Pose {
    let m = raw.rotation_matrix();
    let determinant = m.determinant();
    if (determinant - 1.).abs() > ROTATION_DETERMINANT_TOLERANCE {
      warn!("{}", CaptureError::DegenerateRotationInput { determinant });
    }
    Pose {
      position: raw.translation(),
      orientation: from_rotation_matrix(&m),
    }
  }

  pub fn transformed(&self, offset: &FrameOffset, composition: Composition) -> Pose {
    match composition {
      Composition::Rigid => Pose {
        position: offset.apply(&self.position),
        orientation: offset.rotation * self.orientation,
      },
      Composition::Additive => Pose {
        position: self.position + offset.translation,
        orientation: self.orientation * offset.rotation,
      },
    }
  }

  // Mirrors `axis`. Mirroring one axis of a rotation negates the two
  // quaternion imaginary components of the other axes.
  pub fn mirrored(&self, axis: Axis) -> Pose {
    let i = axis.index();
    let mut position = self.position;
    position[i] = -position[i];
    let q = self.orientation.quaternion();
    let mut imag = q.imag();
    for j in 0..3 {
      if j != i { imag[j] = -imag[j] }
    }
    Pose {
      position,
      orientation: UnitQuaterniond::new_unchecked(Quaterniond::from_parts(q.w, imag)),
    }
  }

  // Interprets `self` as local to `frame`.
  pub fn in_frame(&self, frame: &ConsumerFrame) -> Pose {
    Pose {
      position: frame.origin + frame.rotation * self.position,
      orientation: frame.rotation * self.orientation,
    }
  }
}

// The consumer's reference transform, normally the tracked head.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConsumerFrame {
  pub origin: Vector3d,
  pub rotation: UnitQuaterniond,
}

impl ConsumerFrame {
  pub fn identity() -> ConsumerFrame {
    ConsumerFrame {
      origin: Vector3d::zeros(),
      rotation: UnitQuaterniond::identity(),
    }
  }
}

// Converts detections of one camera. Cheap to share between threads.
#[derive(Clone, Debug)]
pub struct PoseConverter {
  // Camera frame offset followed by the head-center offset.
  offset: FrameOffset,
  convention: Convention,
}

impl PoseConverter {
  pub fn new(
    camera_offset: FrameOffset,
    head_center_offset: Vector3d,
    convention: Convention,
  ) -> PoseConverter {
    let offset = convention.composition.chain(
      &camera_offset,
      &FrameOffset::from_translation(head_center_offset),
    );
    PoseConverter {
      offset,
      convention,
    }
  }

  pub fn convert(&self, raw: &RawMarkerPose, frame: &ConsumerFrame) -> Pose {
    Pose::from_raw(raw)
      .transformed(&self.offset, self.convention.composition)
      .mirrored(self.convention.flip_axis)
      .in_frame(frame)
  }
}

// Pose handed to the consumer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinalPose {
  pub time: f64,
  pub frame_number: usize,
  pub position: [f64; 3],
  // x, y, z, w.
  pub orientation: [f64; 4],
}

impl FinalPose {
  pub fn new(time: f64, frame_number: usize, pose: &Pose) -> FinalPose {
    FinalPose {
      time,
      frame_number,
      position: [pose.position[0], pose.position[1], pose.position[2]],
      orientation: quaternion_to_xyzw(pose.orientation.quaternion()),
    }
  }
}
