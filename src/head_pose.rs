// Head tracking samples from the device and their conversion into the
// consumer's coordinate system, where they serve as the reference frame of
// marker poses.

use crate::all::*;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HeadPose {
  // x, y, z, w in the device convention.
  pub rotation: [f64; 4],
  pub position: [f64; 3],
}

impl HeadPose {
  // The device frame is rotated a quarter turn around z relative to the
  // consumer frame and has its z axis mirrored:
  //   position (x, y, z) -> (-y, x, -z),
  //   rotation q -> Rz(90°) (qx, qy, -qz, -qw).
  pub fn to_consumer_frame(&self) -> ConsumerFrame {
    let p = &self.position;
    let q = quaternion_from_xyzw(self.rotation);
    let q = if q.norm() > 0. {
      Quaterniond::new(-q.w, q.i, q.j, -q.k)
    }
    else {
      warn!("Zero head rotation, using identity.");
      Quaterniond::identity()
    };
    let quarter_turn = UnitQuaterniond::from_axis_angle(&Vector3d::z_axis(), std::f64::consts::FRAC_PI_2);
    ConsumerFrame {
      origin: Vector3d::new(-p[1], p[0], -p[2]),
      rotation: quarter_turn * UnitQuaterniond::new_normalize(q),
    }
  }
}
