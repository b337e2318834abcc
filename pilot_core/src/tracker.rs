//! Calibration sequencer and per-frame driver.
//!
//! `MotionTracker` owns the tracking state, the operator lock, the learned
//! references and the validated mapping.  The sensor path calls
//! [`on_frame`](MotionTracker::on_frame) once per body frame; the operator
//! drives the sequence with [`advance`](MotionTracker::advance) and
//! [`cancel`](MotionTracker::cancel).
//!
//! | State | Per-frame work |
//! |---|---|
//! | `Idle` | nothing |
//! | `Searching` | lock onto a lone body; the advance gate is open only while exactly one body is tracked |
//! | `Learn(p)` | overwrite `p` with the operator's projected hand on every frame |
//! | `Tracking` | map both hands to axes and commit them to the sample store |

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::body::{Hand, TrackedBody};
use crate::calibration::{ReferencePoint, References, TrackingState};
use crate::error::{CalibrationError, StepError};
use crate::geometry::{Point2, Projector};
use crate::mapping::{ControlMapping, MappingConfig};
use crate::operator::OperatorLock;
use crate::sample::{Axes, SampleStore};

// ════════════════════════════════════════════════════════════════════════════
// Revision: change counter polled by observers
// ════════════════════════════════════════════════════════════════════════════

/// Monotonic counter bumped whenever the tracker's visible state changes.
/// Observers keep the last value they rendered and re-read on mismatch.
#[derive(Clone, Debug, Default)]
pub struct Revision(Arc<AtomicU64>);

impl Revision {
    pub fn get(&self) -> u64 { self.0.load(Ordering::Acquire) }

    fn bump(&self) { self.0.fetch_add(1, Ordering::AcqRel); }
}

/// What one frame did, mostly for status display and tests.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    Idle,
    /// Searching; carries the lone body's id if there was exactly one.
    Searching(Option<u64>),
    Learned(ReferencePoint, Point2),
    Mapped(Axes),
    /// The locked operator (or one of their hands) is missing from this frame.
    NoOperator,
    /// Tracking but the calibration is unusable.
    Suspended,
}

// ════════════════════════════════════════════════════════════════════════════
// MotionTracker
// ════════════════════════════════════════════════════════════════════════════

pub struct MotionTracker {
    state:     TrackingState,
    gate_open: bool,
    operator:  OperatorLock,
    refs:      References,
    mapping:   Option<ControlMapping>,
    fault:     Option<CalibrationError>,
    config:    MappingConfig,
    projector: Box<dyn Projector>,
    store:     SampleStore,
    axes:      Axes,
    revision:  Revision,
}

impl MotionTracker {
    pub fn new<P: Projector + 'static>(store: SampleStore, projector: P, config: MappingConfig) -> Self {
        MotionTracker {
            state:     TrackingState::Idle,
            gate_open: true,
            operator:  OperatorLock::new(),
            refs:      References::new(),
            mapping:   None,
            fault:     None,
            config,
            projector: Box::new(projector),
            store,
            axes:      Axes::default(),
            revision:  Revision::default(),
        }
    }

    // ── operator commands ────────────────────────────────────────────────

    /// Move to the next calibration step.
    ///
    /// Refused while searching unless exactly one body is in frame, and while
    /// learning until the current point has been seen at least once.
    /// `Tracking` stays `Tracking`.
    pub fn advance(&mut self) -> Result<TrackingState, StepError> {
        if let Err(e) = self.check_gate() {
            tracing::debug!(state = ?self.state, "advance refused: {e}");
            return Err(e);
        }
        let next = self.state.next();
        if next != self.state {
            self.enter(next);
        }
        Ok(self.state)
    }

    /// Back to `Idle` from anywhere: forget the operator and every learned
    /// point, and zero the axes so a stale setpoint is not left streaming.
    pub fn cancel(&mut self) {
        let was = self.state;
        self.state     = TrackingState::Idle;
        self.gate_open = true;
        self.operator.release();
        self.refs.clear();
        self.mapping = None;
        self.fault   = None;
        self.axes    = Axes::default();
        self.store.commit_axes(self.axes);
        self.revision.bump();
        tracing::info!(from = ?was, "tracking cancelled");
    }

    // ── sensor callbacks ─────────────────────────────────────────────────

    pub fn on_availability_changed(&mut self, available: bool) {
        if available {
            tracing::info!("sensor available");
        } else {
            tracing::warn!("sensor unavailable, cancelling");
            self.cancel();
        }
    }

    /// Process one body frame according to the current state.
    pub fn on_frame(&mut self, bodies: &[TrackedBody]) -> FrameOutcome {
        match self.state {
            TrackingState::Idle => FrameOutcome::Idle,

            TrackingState::Searching => {
                let found = self.operator.search(bodies);
                let open = found.is_some();
                if open != self.gate_open {
                    self.gate_open = open;
                    self.revision.bump();
                }
                FrameOutcome::Searching(found)
            }

            TrackingState::Learn(point) => {
                let Some(at) = self.operator_hand(bodies, point.hand()) else {
                    return FrameOutcome::NoOperator;
                };
                self.refs.record(point, at);
                self.revision.bump();
                FrameOutcome::Learned(point, at)
            }

            TrackingState::Tracking => {
                let Some(mapping) = self.mapping.as_ref() else {
                    return FrameOutcome::Suspended;
                };
                let (Some(left), Some(right)) = (
                    self.operator_hand(bodies, Hand::Left),
                    self.operator_hand(bodies, Hand::Right),
                ) else {
                    return FrameOutcome::NoOperator;
                };
                let axes = mapping.map(left, right);
                self.store.commit_axes(axes);
                self.axes = axes;
                self.revision.bump();
                FrameOutcome::Mapped(axes)
            }
        }
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> TrackingState             { self.state }
    pub fn operator(&self) -> Option<u64>            { self.operator.operator() }
    pub fn references(&self) -> &References          { &self.refs }
    pub fn axes(&self) -> Axes                       { self.axes }
    pub fn fault(&self) -> Option<&CalibrationError> { self.fault.as_ref() }
    pub fn store(&self) -> &SampleStore              { &self.store }
    pub fn config(&self) -> &MappingConfig           { &self.config }
    pub fn revision(&self) -> u64                    { self.revision.get() }

    /// A handle observers on other threads can poll.
    pub fn watch(&self) -> Revision { self.revision.clone() }

    /// Whether `advance` would succeed right now.
    pub fn can_advance(&self) -> bool { self.check_gate().is_ok() }

    // ── internals ────────────────────────────────────────────────────────

    fn check_gate(&self) -> Result<(), StepError> {
        match self.state {
            TrackingState::Searching if !self.gate_open || self.operator.operator().is_none() => {
                Err(StepError::NoLoneOperator)
            }
            TrackingState::Learn(p) if self.refs.get(p).is_none() => Err(StepError::NotRecorded(p)),
            _ => Ok(()),
        }
    }

    fn enter(&mut self, next: TrackingState) {
        self.state = next;
        match next {
            TrackingState::Searching => self.gate_open = false,
            TrackingState::Tracking  => self.arm_mapping(),
            TrackingState::Idle | TrackingState::Learn(_) => self.gate_open = true,
        }
        self.revision.bump();
        tracing::info!(state = ?next, prompt = %next.label(), "calibration step");
    }

    fn arm_mapping(&mut self) {
        match self.refs.complete().and_then(|set| ControlMapping::new(&set, &self.config)) {
            Ok(m) => {
                self.mapping = Some(m);
                self.fault = None;
            }
            Err(e) => {
                tracing::warn!("recalibration required: {e}");
                self.mapping = None;
                self.fault = Some(e);
            }
        }
    }

    /// The operator's projected hand, or `None` when it is missing or the
    /// projection is not a finite point.
    fn operator_hand(&self, bodies: &[TrackedBody], hand: Hand) -> Option<Point2> {
        let body = self.operator.locate(bodies)?;
        let at = self.projector.project(body.hand(hand)?);
        if at.x.is_finite() && at.y.is_finite() {
            Some(at)
        } else {
            tracing::debug!(?hand, "dropping non-finite hand position");
            None
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
