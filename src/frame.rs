use crate::all::*;

// One captured frame as seen by the tracker. Recorded input carries the
// detector output of the frame instead of pixel data.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Frame {
  pub number: usize,
  pub width: usize,
  pub height: usize,
  #[serde(default, rename = "marker")]
  pub recorded_marker: Option<RawMarkerPose>,
}
