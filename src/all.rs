// NOTE This kind of import-all file isn't a common Rust idiom.

pub use crate::{
  camera::*,
  camera_fisheye::*,
  camera_pinhole::*,
  camera_setup::*,
  capture::*,
  detector::*,
  error::*,
  frame::*,
  frame_offset::*,
  head_pose::*,
  input::*,
  math::*,
  mesh::*,
  parameters::*,
  pose::*,
  pose_slot::*,
  tracker::*,
  types::*,
};

pub use {
  std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
  },
  log::{debug, info, warn, LevelFilter},
  serde::{Deserialize, Serialize},
  anyhow::{anyhow, bail, Context as AnyhowContext, Result},
};
