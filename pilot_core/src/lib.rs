//! # pilot_core
//!
//! Turns an operator's hand positions, as seen by a body-tracking sensor,
//! into flight setpoints (thrust, yaw, pitch, roll) and streams them to the
//! vehicle at a fixed rate.
//!
//! ## Data flow
//!
//! ```text
//! sensor frame ─► OperatorLock ─► MotionTracker ─┬─ Learn(p): record reference p
//!                                                └─ Tracking: ControlMapping ─► SampleStore
//!                                                                                   │
//!                                          Transmitter (every period_ms) ◄─────────┘
//!                                                   │
//!                                                   ▼
//!                                              ControlSink
//! ```
//!
//! ## Calibration order
//!
//! `Idle → Searching → Learn(LeftMiddle, LeftTop, LeftBottom, LeftLeft,
//! LeftRight, RightMiddle, RightTop, RightBottom, RightLeft, RightRight) →
//! Tracking`.  The operator must be alone in frame to leave `Searching`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pilot_core::{PilotConfig, PilotContext, ScreenProjector, NullSink, shared_sink};
//!
//! let mut ctx = PilotContext::new(shared_sink(NullSink::default()), ScreenProjector::identity(), &PilotConfig::default());
//! ctx.start_link();
//! ctx.tracker_mut().advance().ok();     // Idle → Searching
//! // feed ctx.tracker_mut().on_frame(&bodies) from the sensor callback
//! ctx.shutdown();
//! ```

pub mod body;
pub mod calibration;
pub mod context;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod operator;
pub mod sample;
pub mod sink;
pub mod tracker;
pub mod transmit;

pub use body::{Hand, JointName, TrackedBody};
pub use calibration::{ReferencePoint, ReferenceSet, References, TrackingState};
pub use context::{PilotConfig, PilotContext};
pub use error::{CalibrationError, SinkError, StepError};
pub use geometry::{Point2, Point3, Projector, ScreenProjector};
pub use mapping::{Axis, ControlMapping, MappingConfig};
pub use operator::OperatorLock;
pub use sample::{Axes, ControlSample, SampleStore};
pub use sink::{ControlSink, NullSink, RecordingSink};
pub use tracker::{FrameOutcome, MotionTracker, Revision};
pub use transmit::{shared_sink, SharedSink, TransmitConfig, Transmitter};
