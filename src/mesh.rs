// Reprojection surface for undistorting a raw camera feed on the GPU.
//
// The mesh lies on the z = 1 plane of the camera frame and covers the part of
// that plane visible in the raw image. Each vertex carries the UV of the
// distorted pixel it sees, so texturing the mesh with the raw image and
// rendering it from the camera position shows an undistorted view.

use crate::all::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraSide {
  Left,
  Right,
}

impl CameraSide {
  pub fn from_index(index: usize) -> CameraSide {
    if index == 0 { CameraSide::Left } else { CameraSide::Right }
  }

  // Coordinate a stereo shader uses to select the half of a side-by-side texture.
  pub fn selector(self) -> f32 {
    match self {
      CameraSide::Left => 0.,
      CameraSide::Right => 1.,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UndistortVertex {
  pub position: [f32; 3],
  pub uv: [f32; 2],
  pub camera: f32,
}

// Placement of a camera's undistortion plane relative to the head, in the
// renderer's axes. Positions map as (x, y, z) -> (-x, -z, y).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanePose {
  pub position: [f64; 3],
  // x, y, z, w.
  pub orientation: [f64; 4],
}

// Camera rig axes expressed in renderer axes.
fn renderer_axes() -> Matrix3d {
  Matrix3d::new(
    -1., 0., 0.,
    0., 0., -1.,
    0., 1., 0.,
  )
}

impl PlanePose {
  pub fn from_extrinsics(extrinsics: &Extrinsics) -> PlanePose {
    let a = renderer_axes();
    let p = a * extrinsic_position(extrinsics);
    let r = UnitQuaterniond::new_unchecked(extrinsic_orientation(extrinsics))
      .to_rotation_matrix()
      .into_inner();
    // The axis change is a reflection, conjugating with it keeps the rotation proper.
    let q = from_rotation_matrix(&(a * r * a.transpose()));
    PlanePose {
      position: [p[0], p[1], p[2]],
      orientation: quaternion_to_xyzw(q.quaternion()),
    }
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct UndistortMesh {
  pub vertices: Vec<UndistortVertex>,
  // Three indices per triangle.
  pub triangles: Vec<u32>,
}

impl UndistortMesh {
  pub fn build(
    model: &dyn CameraModel,
    side: CameraSide,
    resolution: usize,
  ) -> std::result::Result<UndistortMesh, CaptureError> {
    if resolution == 0 { return Err(CaptureError::InvalidMeshResolution) }
    let intrinsics = model.intrinsics();
    let width = intrinsics.width() as f64;
    let height = intrinsics.height() as f64;
    let center = intrinsics.principal_point();

    let solve = |pixel: Vector2d| {
      let solve = model.undistort(pixel);
      if let Err(err) = solve.check() {
        warn!("Mesh extent at pixel ({}, {}): {}", pixel[0], pixel[1], err);
      }
      solve.point
    };
    let x_min = solve(Vector2d::new(0., center[1]))[0];
    let y_min = solve(Vector2d::new(center[0], 0.))[1];
    let x_max = solve(Vector2d::new(width - 1., center[1]))[0];
    let y_max = solve(Vector2d::new(center[0], height - 1.))[1];
    debug!("Mesh extent x [{:.4}, {:.4}], y [{:.4}, {:.4}].", x_min, x_max, y_min, y_max);

    let n = resolution;
    let camera = side.selector();
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for iy in 0..=n {
      let y = y_min + iy as f64 / n as f64 * (y_max - y_min);
      for ix in 0..=n {
        let x = x_min + ix as f64 / n as f64 * (x_max - x_min);
        let pixel = model.distort(Vector2d::new(x, y));
        vertices.push(UndistortVertex {
          position: [x as f32, y as f32, 1.],
          uv: [(pixel[0] / width) as f32, (1. - pixel[1] / height) as f32],
          camera,
        });
      }
    }

    let row = n + 1;
    let mut triangles = Vec::with_capacity(6 * n * n);
    for iy in 0..n {
      for ix in 0..n {
        let a = (iy * row + ix) as u32;
        let b = a + 1;
        let c = b + row as u32;
        let d = a + row as u32;
        triangles.extend_from_slice(&[c, b, a, d, c, a]);
      }
    }

    Ok(UndistortMesh {
      vertices,
      triangles,
    })
  }

  pub fn triangle_count(&self) -> usize {
    self.triangles.len() / 3
  }
}
