use crate::all::*;

use std::thread::JoinHandle;

#[derive(Debug, Default)]
pub struct CaptureStats {
  pub frames: usize,
  pub detections: usize,
  // Poses replaced before the consumer took them.
  pub superseded: usize,
}

// Replays `input` through `tracker` on a separate thread, the way frame
// callbacks of the capture library arrive off the consumer's thread.
pub fn spawn_capture(
  mut input: Input,
  mut tracker: Tracker,
  sender: PoseSender<FinalPose>,
) -> Result<JoinHandle<Result<CaptureStats>>> {
  let handle = std::thread::Builder::new()
    .name("capture".to_string())
    .spawn(move || {
      let mut stats = CaptureStats::default();
      while let Some(input_data) = input.next()? {
        if let Some(pose) = tracker.process(&input_data) {
          if sender.publish(pose) { stats.superseded += 1 }
        }
      }
      stats.frames = tracker.frame_count;
      stats.detections = tracker.detection_count;
      Ok(stats)
    })
    .context("Failed to spawn capture thread.")?;
  Ok(handle)
}

pub fn join_capture(handle: JoinHandle<Result<CaptureStats>>) -> Result<CaptureStats> {
  handle.join()
    .map_err(|_| anyhow!("Capture thread panicked."))?
}
