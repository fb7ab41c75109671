use crate::all::*;

// Fiducial marker detection. Runs on the capture thread once per frame.
// Not finding a marker is the normal outcome for most frames and is not an
// error.
pub trait MarkerDetector: Send {
  fn detect(&mut self, frame: &Frame) -> Option<RawMarkerPose>;
}

// Replays detector output stored with the recorded frames.
pub struct RecordedDetector;

impl MarkerDetector for RecordedDetector {
  fn detect(&mut self, frame: &Frame) -> Option<RawMarkerPose> {
    frame.recorded_marker.clone()
  }
}
