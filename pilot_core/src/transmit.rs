//! Fixed-rate setpoint transmission.
//!
//! A dedicated thread copies the current sample out of the [`SampleStore`]
//! every period and hands it to the sink.  The copy is taken under the store
//! lock and the send happens after the lock is released, so sink latency
//! never stalls frame processing.
//!
//! Start sequence: connect the sink if needed, send one disengaged sample
//! (zero axes, current flags) to unlock the receiver, then loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::sample::{ControlSample, SampleStore};
use crate::sink::ControlSink;

/// Sink shared between the transmission thread and whoever manages the link.
pub type SharedSink = Arc<Mutex<Box<dyn ControlSink>>>;

pub fn shared_sink<S: ControlSink + 'static>(sink: S) -> SharedSink {
    Arc::new(Mutex::new(Box::new(sink)))
}

pub(crate) fn lock_sink(sink: &SharedSink) -> MutexGuard<'_, Box<dyn ControlSink>> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmitConfig {
    /// Interval between setpoints.
    pub period_ms: u64,
}

impl Default for TransmitConfig {
    fn default() -> Self { TransmitConfig { period_ms: 10 } }
}

impl TransmitConfig {
    pub fn period(&self) -> Duration { Duration::from_millis(self.period_ms.max(1)) }
}

// ════════════════════════════════════════════════════════════════════════════
// Transmitter: handle to the transmission thread
// ════════════════════════════════════════════════════════════════════════════

pub struct Transmitter {
    store:  SampleStore,
    sink:   SharedSink,
    period: Duration,
    run:    Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Transmitter {
    pub fn new(store: SampleStore, sink: SharedSink, cfg: &TransmitConfig) -> Self {
        Transmitter {
            store,
            sink,
            period: cfg.period(),
            run:    Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn sink(&self) -> &SharedSink { &self.sink }

    pub fn period(&self) -> Duration { self.period }

    /// True while the stop flag is clear or the thread has not yet exited.
    pub fn is_running(&self) -> bool {
        self.run.load(Ordering::Acquire)
            || self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the transmission thread.  Returns `false` (and does nothing) if
    /// one is already running or still winding down.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        if let Some(old) = self.handle.take() {
            let _ = old.join();
        }

        {
            let mut sink = lock_sink(&self.sink);
            if !sink.is_connected() {
                if let Err(e) = sink.connect() {
                    // Keep going: sends fail quietly until the link comes up.
                    tracing::warn!("sink connect failed: {e}");
                }
            }
        }

        self.run.store(true, Ordering::Release);
        let store  = self.store.clone();
        let sink   = Arc::clone(&self.sink);
        let run    = Arc::clone(&self.run);
        let period = self.period;

        let spawned = thread::Builder::new()
            .name("setpoint-tx".to_string())
            .spawn(move || transmit_loop(store, sink, run, period));

        match spawned {
            Ok(h) => {
                self.handle = Some(h);
                true
            }
            Err(e) => {
                self.run.store(false, Ordering::Release);
                tracing::error!("could not spawn transmission thread: {e}");
                false
            }
        }
    }

    /// Ask the thread to exit.  Does not wait; watch [`is_running`](Self::is_running)
    /// or call [`join_timeout`](Self::join_timeout).
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.run.store(false, Ordering::Release);
        true
    }

    /// Wait up to `timeout` for the thread to exit.  Returns whether it has.
    pub fn join_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                tracing::error!("transmission thread panicked");
            }
        }
        true
    }
}

impl Drop for Transmitter {
    fn drop(&mut self) {
        self.stop();
        if !self.join_timeout(self.period * 4) {
            tracing::warn!("transmission thread still running at shutdown");
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// transmit_loop: the thread body
// ════════════════════════════════════════════════════════════════════════════

fn transmit_loop(store: SampleStore, sink: SharedSink, run: Arc<AtomicBool>, period: Duration) {
    deliver(&sink, &store.snapshot().disengaged());
    tracing::info!(period_ms = period.as_millis() as u64, "setpoint stream started");

    let mut sent: u64 = 1;
    let mut next = Instant::now();
    while run.load(Ordering::Acquire) {
        let sample = store.snapshot();
        deliver(&sink, &sample);
        sent += 1;

        // Deadline pacing; after an overrun resync rather than burst.
        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            next = now;
        }
    }

    tracing::info!(sent, "setpoint stream stopped");
}

fn deliver(sink: &SharedSink, sample: &ControlSample) {
    lock_sink(sink).send(sample);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
