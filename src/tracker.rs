use crate::all::*;

// Turns the capture stream of one camera into poses in the consumer frame.
pub struct Tracker {
  detector: Box<dyn MarkerDetector>,
  converter: PoseConverter,
  consumer_frame: ConsumerFrame,
  last_time: Option<f64>,
  // Calibrated image size, frames of other sizes are reported once.
  image_size: Option<[usize; 2]>,
  pub frame_count: usize,
  pub detection_count: usize,
}

impl Tracker {
  pub fn new(camera: &Camera, detector: Box<dyn MarkerDetector>) -> Tracker {
    let (head_center_offset, convention) = {
      let p = PARAMETER_SET.lock().unwrap();
      (p.head_center_offset, p.convention())
    };
    let camera_offset = FrameOffset::from_extrinsics(&camera.extrinsics);
    debug!("{:?} camera {} offset: rotation {:?}, translation {:?}.",
      camera.sensor, camera.index, camera_offset.rotation, camera_offset.translation);
    let mut tracker = Tracker::with_converter(
      PoseConverter::new(camera_offset, head_center_offset, convention),
      detector,
    );
    tracker.image_size = Some(camera.intrinsics().size);
    tracker
  }

  pub fn with_converter(converter: PoseConverter, detector: Box<dyn MarkerDetector>) -> Tracker {
    Tracker {
      detector,
      converter,
      consumer_frame: ConsumerFrame::identity(),
      last_time: None,
      image_size: None,
      frame_count: 0,
      detection_count: 0,
    }
  }

  pub fn process(&mut self, input_data: &InputData) -> Option<FinalPose> {
    if let Some(last_time) = self.last_time {
      if input_data.time < last_time {
        warn!("Ignoring unordered sensor sample.");
        return None;
      }
    }
    self.last_time = Some(input_data.time);

    match input_data.sensor {
      InputDataSensor::Head(ref head) => {
        self.consumer_frame = head.to_consumer_frame();
        None
      },
      InputDataSensor::Frame(ref frame) => {
        self.frame_count += 1;
        if let Some(size) = self.image_size {
          if size != [frame.width, frame.height] {
            warn!("Frame {} is {}x{}, calibration is for {}x{}.",
              frame.number, frame.width, frame.height, size[0], size[1]);
            self.image_size = None;
          }
        }
        let raw = self.detector.detect(frame)?;
        self.detection_count += 1;
        let pose = self.converter.convert(&raw, &self.consumer_frame);
        Some(FinalPose::new(input_data.time, frame.number, &pose))
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame(time: f64, number: usize, translation: Option<[f64; 3]>) -> InputData {
    InputData {
      time,
      sensor: InputDataSensor::Frame(Frame {
        number,
        width: 1536,
        height: 1404,
        recorded_marker: translation.map(|translation| RawMarkerPose {
          rotation: [1., 0., 0., 0., 1., 0., 0., 0., 1.],
          translation,
        }),
      }),
    }
  }

  fn tracker() -> Tracker {
    let converter = PoseConverter::new(FrameOffset::identity(), Vector3d::zeros(), Convention::default());
    Tracker::with_converter(converter, Box::new(RecordedDetector))
  }

  #[test]
  fn test_process() {
    let mut tracker = tracker();
    assert!(tracker.process(&frame(0., 0, None)).is_none());
    let pose = tracker.process(&frame(0.033, 1, Some([0.1, 0.2, 1.]))).unwrap();
    assert_eq!(pose.frame_number, 1);
    assert_eq!(pose.time, 0.033);
    assert!((Vector3d::from(pose.position) - Vector3d::new(0.1, -0.2, 1.)).norm() < 1e-12);
    assert_eq!(tracker.frame_count, 2);
    assert_eq!(tracker.detection_count, 1);
  }

  #[test]
  fn test_head_pose_sets_consumer_frame() {
    let mut tracker = tracker();
    let head = InputData {
      time: 0.,
      sensor: InputDataSensor::Head(HeadPose {
        rotation: [0., 0., 0., 1.],
        position: [0., 1., 0.],
      }),
    };
    assert!(tracker.process(&head).is_none());
    let pose = tracker.process(&frame(0.01, 0, Some([0., 0., 1.]))).unwrap();
    // Head origin (-1, 0, 0), quarter turn around z does not move the z axis.
    assert!((Vector3d::from(pose.position) - Vector3d::new(-1., 0., 1.)).norm() < 1e-12);
  }

  #[test]
  fn test_unordered_samples() {
    let mut tracker = tracker();
    assert!(tracker.process(&frame(1., 0, Some([0., 0., 1.]))).is_some());
    assert!(tracker.process(&frame(0.5, 1, Some([0., 0., 1.]))).is_none());
    assert_eq!(tracker.frame_count, 1);
  }
}
