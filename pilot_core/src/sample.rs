//! The control sample and the store that guards it.
//!
//! One `Mutex` covers the whole sample.  Writers replace the four axes in
//! one critical section and readers copy the whole struct out, so a reader
//! can never see thrust from one frame next to yaw from another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// The four flight axes computed from one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub thrust: f64,
    pub yaw:    f64,
    pub pitch:  f64,
    pub roll:   f64,
}

/// Everything sent to the vehicle in one setpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSample {
    /// Percent; may be out of [0,100] here, the encoder clamps.
    pub thrust: f64,
    pub yaw:    f64,
    pub pitch:  f64,
    pub roll:   f64,
    pub estop:  bool,
    pub aux1:   bool,
    pub aux2:   bool,
}

impl ControlSample {
    pub fn axes(&self) -> Axes {
        Axes { thrust: self.thrust, yaw: self.yaw, pitch: self.pitch, roll: self.roll }
    }

    /// Same flags, all axes zero.  Sent once at link start to unlock a
    /// receiver that latched from a previous session.
    pub fn disengaged(&self) -> ControlSample {
        ControlSample { estop: self.estop, aux1: self.aux1, aux2: self.aux2, ..ControlSample::default() }
    }

    fn set_axes(&mut self, axes: Axes) {
        self.thrust = axes.thrust;
        self.yaw    = axes.yaw;
        self.pitch  = axes.pitch;
        self.roll   = axes.roll;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SampleStore
// ════════════════════════════════════════════════════════════════════════════

/// Cloneable handle to the single current control sample.
#[derive(Clone, Debug, Default)]
pub struct SampleStore {
    inner: Arc<Mutex<ControlSample>>,
}

impl SampleStore {
    pub fn new() -> Self { SampleStore::default() }

    pub fn with_sample(sample: ControlSample) -> Self {
        SampleStore { inner: Arc::new(Mutex::new(sample)) }
    }

    // A panic while holding the lock cannot leave a half-written sample
    // (every update is a plain field copy), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, ControlSample> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of the whole sample.
    pub fn snapshot(&self) -> ControlSample { *self.lock() }

    pub fn replace(&self, sample: ControlSample) { *self.lock() = sample; }

    /// Replace thrust/yaw/pitch/roll together, leaving the flags alone.
    pub fn commit_axes(&self, axes: Axes) { self.lock().set_axes(axes); }

    pub fn set_estop(&self, on: bool) { self.lock().estop = on; }
    pub fn set_aux1(&self, on: bool)  { self.lock().aux1 = on; }
    pub fn set_aux2(&self, on: bool)  { self.lock().aux2 = on; }

    /// Flip the emergency stop and return the new value.
    pub fn toggle_estop(&self) -> bool {
        let mut s = self.lock();
        s.estop = !s.estop;
        s.estop
    }

    pub fn toggle_aux1(&self) -> bool {
        let mut s = self.lock();
        s.aux1 = !s.aux1;
        s.aux1
    }

    pub fn toggle_aux2(&self) -> bool {
        let mut s = self.lock();
        s.aux2 = !s.aux2;
        s.aux2
    }
}
