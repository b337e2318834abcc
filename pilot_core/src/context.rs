//! Application context: the tracker and the transmitter, built once and
//! torn down together.

use serde::{Deserialize, Serialize};

use crate::geometry::Projector;
use crate::mapping::MappingConfig;
use crate::sample::SampleStore;
use crate::tracker::MotionTracker;
use crate::transmit::{lock_sink, SharedSink, TransmitConfig, Transmitter};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub mapping:  MappingConfig,
    pub transmit: TransmitConfig,
}

/// Owns everything the frame path and the transmission thread share.
pub struct PilotContext {
    tracker:     MotionTracker,
    transmitter: Transmitter,
}

impl PilotContext {
    pub fn new<P: Projector + 'static>(sink: SharedSink, projector: P, cfg: &PilotConfig) -> Self {
        let store = SampleStore::new();
        let tracker = MotionTracker::new(store.clone(), projector, cfg.mapping.clone());
        let transmitter = Transmitter::new(store, sink, &cfg.transmit);
        PilotContext { tracker, transmitter }
    }

    pub fn tracker(&self) -> &MotionTracker          { &self.tracker }
    pub fn tracker_mut(&mut self) -> &mut MotionTracker { &mut self.tracker }
    pub fn store(&self) -> &SampleStore              { self.tracker.store() }

    /// Whether the transmission thread is running.
    pub fn link_running(&self) -> bool { self.transmitter.is_running() }

    pub fn link_connected(&self) -> bool {
        lock_sink(self.transmitter.sink()).is_connected()
    }

    /// Connect the sink (if needed) and start streaming setpoints.
    pub fn start_link(&mut self) -> bool { self.transmitter.start() }

    /// Stop streaming and drop the connection.
    pub fn stop_link(&mut self) -> bool {
        if !self.transmitter.stop() {
            return false;
        }
        let wait = self.transmitter.period() * 4;
        if !self.transmitter.join_timeout(wait) {
            tracing::warn!("transmission thread did not exit within {wait:?}");
        }
        lock_sink(self.transmitter.sink()).disconnect();
        true
    }

    /// Start if stopped, stop if running.  Returns whether the link now runs.
    pub fn toggle_link(&mut self) -> bool {
        if self.link_running() {
            self.stop_link();
        } else {
            self.start_link();
        }
        self.link_running()
    }

    pub fn shutdown(&mut self) {
        self.stop_link();
        self.tracker.cancel();
        tracing::info!("pilot context shut down");
    }
}
