// Handoff of poses from the capture thread to the consumer.
//
// At most one pose is pending. Publishing while a pose is still unconsumed
// replaces it: only the latest observation matters for tracking.

use crate::all::*;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;

pub struct PoseSender<T> {
  tx: Sender<T>,
  // Used to evict the pending value when the slot is full.
  evict: Receiver<T>,
}

pub struct PoseReceiver<T> {
  rx: Receiver<T>,
}

pub fn pose_slot<T>() -> (PoseSender<T>, PoseReceiver<T>) {
  let (tx, rx) = crossbeam_channel::bounded(1);
  (
    PoseSender { tx, evict: rx.clone() },
    PoseReceiver { rx },
  )
}

impl<T> PoseSender<T> {
  // Returns true if an unconsumed value was replaced.
  pub fn publish(&self, value: T) -> bool {
    let mut value = value;
    let mut replaced = false;
    loop {
      match self.tx.try_send(value) {
        Ok(()) => return replaced,
        Err(TrySendError::Full(v)) => {
          // The consumer may take the pending value first, then there is
          // nothing to evict and the next send succeeds.
          if self.evict.try_recv().is_ok() { replaced = true }
          value = v;
        },
        // Cannot happen while `evict` keeps the channel open.
        Err(TrySendError::Disconnected(_)) => return replaced,
      }
    }
  }
}

impl<T> PoseReceiver<T> {
  // Waits for the next value. `Ok(None)` on timeout, `Err` once the sender is
  // gone and nothing is pending.
  pub fn wait(&self, timeout: Duration) -> Result<Option<T>> {
    match self.rx.recv_timeout(timeout) {
      Ok(v) => Ok(Some(v)),
      Err(RecvTimeoutError::Timeout) => Ok(None),
      Err(RecvTimeoutError::Disconnected) => bail!("Pose sender disconnected."),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn take<T>(rx: &PoseReceiver<T>) -> Option<T> {
    rx.wait(Duration::from_millis(1)).unwrap()
  }

  #[test]
  fn test_newest_wins() {
    let (tx, rx) = pose_slot();
    assert!(take(&rx).is_none());
    assert!(!tx.publish(1));
    assert!(tx.publish(2));
    assert!(tx.publish(3));
    assert_eq!(take(&rx), Some(3));
    assert!(take(&rx).is_none());
    assert!(!tx.publish(4));
    assert_eq!(take(&rx), Some(4));
  }

  #[test]
  fn test_disconnect() {
    let (tx, rx) = pose_slot();
    tx.publish(1);
    drop(tx);
    // Pending value is still delivered.
    assert_eq!(rx.wait(Duration::from_millis(10)).unwrap(), Some(1));
    assert!(rx.wait(Duration::from_millis(10)).is_err());
  }

  #[test]
  fn test_across_threads() {
    let (tx, rx) = pose_slot();
    let producer = std::thread::spawn(move || {
      for i in 0..1000 {
        tx.publish(i);
      }
    });
    let mut last = None;
    loop {
      match rx.wait(Duration::from_secs(5)) {
        Ok(Some(v)) => {
          // Values arrive in order, possibly with gaps.
          if let Some(last) = last { assert!(v > last) }
          last = Some(v);
        },
        Ok(None) => panic!("Timed out."),
        Err(_) => break,
      }
    }
    producer.join().unwrap();
    assert_eq!(last, Some(999));
  }
}
