//! Downstream transport seam.
//!
//! The core hands finished samples to a [`ControlSink`] and never waits for
//! an acknowledgement.  Wire encoding lives with the implementation.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SinkError;
use crate::sample::ControlSample;

/// Anything that can deliver control samples to the vehicle.
pub trait ControlSink: Send {
    /// Best-effort delivery.  Failures are handled inside the sink.
    fn send(&mut self, sample: &ControlSample);
    fn is_connected(&self) -> bool;
    fn connect(&mut self) -> Result<(), SinkError>;
    fn disconnect(&mut self);
}

// ── null backend ──────────────────────────────────────────────────────────

/// Accepts and drops everything.  Used when no link is configured.
#[derive(Debug, Default)]
pub struct NullSink {
    connected: bool,
}

impl ControlSink for NullSink {
    fn send(&mut self, _sample: &ControlSample) {}
    fn is_connected(&self) -> bool { self.connected }
    fn connect(&mut self) -> Result<(), SinkError> {
        self.connected = true;
        Ok(())
    }
    fn disconnect(&mut self) { self.connected = false; }
}

// ── recording backend ─────────────────────────────────────────────────────

/// Keeps every delivered sample.  Clones share the same log, so a caller can
/// keep one handle for inspection and give another to the transmitter.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    sent:      Arc<Mutex<Vec<ControlSample>>>,
    connected: Arc<Mutex<bool>>,
    connects:  Arc<Mutex<usize>>,
}

impl RecordingSink {
    pub fn new() -> Self { RecordingSink::default() }

    pub fn sent(&self) -> Vec<ControlSample> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// How many times `connect` was called.
    pub fn connects(&self) -> usize {
        *self.connects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ControlSink for RecordingSink {
    fn send(&mut self, sample: &ControlSample) {
        if self.is_connected() {
            self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(*sample);
        }
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connect(&mut self) -> Result<(), SinkError> {
        *self.connects.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        *self.connected.lock().unwrap_or_else(PoisonError::into_inner) = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        *self.connected.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_drops_while_disconnected() {
        let mut sink = RecordingSink::new();
        sink.send(&ControlSample::default());
        assert!(sink.is_empty());
        sink.connect().unwrap();
        sink.send(&ControlSample { thrust: 5.0, ..ControlSample::default() });
        assert_eq!(sink.sent()[0].thrust, 5.0);
    }

    #[test]
    fn recording_sink_clones_share_log() {
        let probe = RecordingSink::new();
        let mut sink = probe.clone();
        sink.connect().unwrap();
        sink.send(&ControlSample::default());
        assert_eq!(probe.len(), 1);
        assert_eq!(probe.connects(), 1);
    }
}
