use crate::all::*;

// Recorded capture session in JSON lines format. Each line has a `time` and
// either a `frame` or a `head` object.
pub struct Input {
  reader: Box<dyn BufRead + Send>,
  line: String,
  line_number: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputData {
  pub time: f64,
  pub sensor: InputDataSensor,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputDataSensor {
  Frame(Frame),
  Head(HeadPose),
}

impl Input {
  pub fn new(path: &Path) -> Result<Input> {
    let file = File::open(path)
      .context(format!("Failed to open input {}.", path.display()))?;
    Ok(Input::from_reader(BufReader::new(file)))
  }

  pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Input {
    Input {
      reader: Box::new(reader),
      line: String::new(),
      line_number: 0,
    }
  }

  // Not using `impl Iterator` to allow returning `Result`.
  // End of data is signaled by `Result::Ok(Option::None)`.
  pub fn next(&mut self) -> Result<Option<InputData>> {
    loop {
      self.line.clear();
      match self.reader.read_line(&mut self.line) {
        Ok(0) => return Ok(None),
        Err(err) => bail!("Failed to read line {}. {}", self.line_number + 1, err),
        _ => {},
      }
      self.line_number += 1;
      if self.line.trim().is_empty() { continue }

      let value: serde_json::Value = serde_json::from_str(&self.line)
        .context(format!("Input::next JSON deserialization failed for line {}: {}", self.line_number, self.line))?;
      let value = value.as_object()
        .ok_or(anyhow!("JSONL line {} is not a map.", self.line_number))?;
      let time = value.get("time").and_then(|x| x.as_f64())
        .ok_or(anyhow!("Time on line {} is not a number.", self.line_number))?;

      if let Some(frame) = value.get("frame") {
        let frame: Frame = serde_json::from_value(frame.clone())
          .context(format!("Invalid frame on line {}.", self.line_number))?;
        return Ok(Some(InputData { time, sensor: InputDataSensor::Frame(frame) }));
      }
      else if let Some(head) = value.get("head") {
        let head: HeadPose = serde_json::from_value(head.clone())
          .context(format!("Invalid head pose on line {}.", self.line_number))?;
        return Ok(Some(InputData { time, sensor: InputDataSensor::Head(head) }));
      }
      else {
        warn!("Unrecognized data on line {}: {}", self.line_number, self.line.trim());
        continue;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn test_read_input() {
    let s = r#"{"time": 0.0, "head": {"rotation": [0, 0, 0, 1], "position": [0, 0, 0]}}

{"time": 0.033, "frame": {"number": 0, "width": 1536, "height": 1404}}
{"time": 0.05, "gyroscope": [0, 0, 0]}
{"time": 0.066, "frame": {"number": 1, "width": 1536, "height": 1404, "marker": {"rotation": [1, 0, 0, 0, 1, 0, 0, 0, 1], "translation": [0, 0, 1]}}}
"#;
    let mut input = Input::from_reader(Cursor::new(s.to_string()));

    let d = input.next().unwrap().unwrap();
    assert_eq!(d.time, 0.);
    assert!(matches!(d.sensor, InputDataSensor::Head(_)));

    let d = input.next().unwrap().unwrap();
    match d.sensor {
      InputDataSensor::Frame(frame) => {
        assert_eq!(frame.number, 0);
        assert!(frame.recorded_marker.is_none());
      },
      _ => panic!("Expected a frame."),
    }

    // Unknown sensor lines are skipped.
    let d = input.next().unwrap().unwrap();
    assert_eq!(d.time, 0.066);
    match d.sensor {
      InputDataSensor::Frame(frame) => {
        assert_eq!(frame.recorded_marker.unwrap().translation, [0., 0., 1.]);
      },
      _ => panic!("Expected a frame."),
    }

    assert!(input.next().unwrap().is_none());
  }

  #[test]
  fn test_invalid_input() {
    let mut input = Input::from_reader(Cursor::new(r#"{"frame": {"number": 0}}"#.to_string()));
    assert!(input.next().is_err());
    let mut input = Input::from_reader(Cursor::new("[1, 2]".to_string()));
    assert!(input.next().is_err());
    let mut input = Input::from_reader(Cursor::new(r#"{"time": 1, "frame": {"number": 0}}"#.to_string()));
    assert!(input.next().is_err());
  }
}
