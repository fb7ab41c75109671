// Eigen-like aliases.
pub type Vector2d = nalgebra::Vector2::<f64>;
pub type Vector3d = nalgebra::Vector3::<f64>;
pub type Matrix2d = nalgebra::Matrix2::<f64>;
pub type Matrix3d = nalgebra::Matrix3::<f64>;
pub type Quaterniond = nalgebra::Quaternion::<f64>;
pub type UnitQuaterniond = nalgebra::UnitQuaternion::<f64>;

// Wire formats store quaternions in x, y, z, w order, nalgebra constructors
// take w first.
pub fn quaternion_from_xyzw(q: [f64; 4]) -> Quaterniond {
  Quaterniond::new(q[3], q[0], q[1], q[2])
}

pub fn quaternion_to_xyzw(q: &Quaterniond) -> [f64; 4] {
  [q.i, q.j, q.k, q.w]
}
