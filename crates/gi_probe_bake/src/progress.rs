//! Bake progress reporting.
//!
//! A bake reports `begin(mesh_count + 1)`, one `step` per plotted mesh
//! (`"Plotting Meshes i/n"`), a final `"Finishing Plot"` step, and `end`
//! once the result has been handed off. All calls happen on the baking
//! thread in ascending step order.

use crossbeam_channel::{self as channel, Receiver, Sender};

/// Receives bake progress. Every method defaults to a no-op.
pub trait BakeObserver {
  fn begin(&mut self, _total_steps: usize) {}
  fn step(&mut self, _step: usize, _label: &str) {}
  fn end(&mut self) {}
}

/// Silent observer.
impl BakeObserver for () {}

/// Progress event as sent by [`ChannelObserver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BakeEvent {
  Begin { total_steps: usize },
  Step { step: usize, label: String },
  End,
}

/// Forwards progress to another thread.
///
/// A disconnected receiver is ignored so a closed progress view never
/// fails the bake.
#[derive(Clone, Debug)]
pub struct ChannelObserver {
  sender: Sender<BakeEvent>,
}

impl ChannelObserver {
  pub fn new(sender: Sender<BakeEvent>) -> Self {
    Self { sender }
  }

  /// Observer plus the receiving end of an unbounded channel.
  pub fn unbounded() -> (Self, Receiver<BakeEvent>) {
    let (tx, rx) = channel::unbounded();
    (Self::new(tx), rx)
  }

  fn send(&self, event: BakeEvent) {
    let _ = self.sender.send(event);
  }
}

impl BakeObserver for ChannelObserver {
  fn begin(&mut self, total_steps: usize) {
    self.send(BakeEvent::Begin { total_steps });
  }

  fn step(&mut self, step: usize, label: &str) {
    self.send(BakeEvent::Step {
      step,
      label: label.to_string(),
    });
  }

  fn end(&mut self) {
    self.send(BakeEvent::End);
  }
}
