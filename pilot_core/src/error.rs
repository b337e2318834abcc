use thiserror::Error;

use crate::calibration::ReferencePoint;
use crate::mapping::Axis;

/// The learned reference points cannot drive the mapping; the operator has to
/// cancel and recalibrate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("reference point {} was never recorded", .0.label())]
    Missing(ReferencePoint),

    #[error("{axis} span is zero ({} and {} coincide)", .from.label(), .to.label())]
    ZeroSpan {
        axis: Axis,
        from: ReferencePoint,
        to:   ReferencePoint,
    },

    #[error("{axis} extremes {} and {} lie on the same side of {}", .low.label(), .high.label(), .middle.label())]
    OneSided {
        axis:   Axis,
        middle: ReferencePoint,
        low:    ReferencePoint,
        high:   ReferencePoint,
    },
}

/// Why an `advance` request was refused.  The state is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("operator must be alone in frame to begin")]
    NoLoneOperator,

    #[error("{} has not been seen yet; hold the pose in view", .0.label())]
    NotRecorded(ReferencePoint),
}

/// Failures at the sink boundary.  Never fatal: the transmission loop logs and
/// carries on with the next period.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink is not connected")]
    NotConnected,

    #[error("encode error: {0}")]
    Encode(String),
}
