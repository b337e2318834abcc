//! Control mapping engine.
//!
//! Converts live left/right hand points into thrust, yaw, pitch and roll
//! using the learned reference points.  Every axis is piecewise linear:
//!
//! * **Thrust** (left hand, vertical): 0 at `LeftTop`, `thrust_full` at
//!   `LeftBottom`.  Not dead-zoned and not clamped; the wire encoder clamps.
//! * **Yaw** (left hand, horizontal): 0 at `LeftMiddle`, `-yaw_limit` at
//!   `LeftLeft`, `+yaw_limit` at `LeftRight`.
//! * **Pitch** (right hand, vertical): 0 at `RightMiddle`, `+pitch_limit` at
//!   `RightTop`, `-pitch_limit` at `RightBottom`.
//! * **Roll** (right hand, horizontal): 0 at `RightMiddle`, `-roll_limit` at
//!   `RightLeft`, `+roll_limit` at `RightRight`.
//!
//! Yaw, pitch and roll output exactly zero inside the dead zone around the
//! middle point and saturate once the hand passes the extreme.  The extreme
//! used is the one lying on the same side of the middle as the hand, so the
//! mapping works whether or not the sensor image is mirrored.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calibration::{ReferencePoint, ReferenceSet};
use crate::error::CalibrationError;
use crate::geometry::Point2;
use crate::sample::Axes;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Thrust,
    Yaw,
    Pitch,
    Roll,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Thrust => "thrust",
            Axis::Yaw    => "yaw",
            Axis::Pitch  => "pitch",
            Axis::Roll   => "roll",
        };
        f.write_str(name)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MappingConfig
// ════════════════════════════════════════════════════════════════════════════

/// Output ranges and dead zone, in reference-frame units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Distance from a middle point inside which yaw/pitch/roll read zero.
    pub dead_zone:   f64,
    /// Thrust at `LeftBottom` (percent).
    pub thrust_full: f64,
    /// Yaw at either horizontal extreme (deg/s).
    pub yaw_limit:   f64,
    /// Pitch at either vertical extreme (deg).
    pub pitch_limit: f64,
    /// Roll at either horizontal extreme (deg).
    pub roll_limit:  f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            dead_zone:   0.5,
            thrust_full: 100.0,
            yaw_limit:   200.0,
            pitch_limit: 30.0,
            roll_limit:  30.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Span: plain linear interpolation (thrust)
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
struct Span {
    from: f64,
    to:   f64,
    full: f64,
}

impl Span {
    fn new(axis: Axis, from: (ReferencePoint, f64), to: (ReferencePoint, f64), full: f64)
        -> Result<Self, CalibrationError>
    {
        if to.1 - from.1 == 0.0 {
            return Err(CalibrationError::ZeroSpan { axis, from: from.0, to: to.0 });
        }
        Ok(Span { from: from.1, to: to.1, full })
    }

    fn apply(&self, live: f64) -> f64 {
        self.full * (live - self.from) / (self.to - self.from)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Deflection: dead-zoned, two-sided, saturating
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
struct Deflection {
    middle:    f64,
    /// Extreme reference coordinate and the output reached there.
    low:       (f64, f64),
    high:      (f64, f64),
    dead_zone: f64,
}

impl Deflection {
    fn new(
        axis:      Axis,
        middle:    (ReferencePoint, f64),
        low:       (ReferencePoint, f64, f64),
        high:      (ReferencePoint, f64, f64),
        dead_zone: f64,
    ) -> Result<Self, CalibrationError> {
        let dl = low.1 - middle.1;
        let dh = high.1 - middle.1;
        if dl == 0.0 {
            return Err(CalibrationError::ZeroSpan { axis, from: middle.0, to: low.0 });
        }
        if dh == 0.0 {
            return Err(CalibrationError::ZeroSpan { axis, from: middle.0, to: high.0 });
        }
        if dl.signum() == dh.signum() {
            return Err(CalibrationError::OneSided { axis, middle: middle.0, low: low.0, high: high.0 });
        }
        Ok(Deflection {
            middle: middle.1,
            low:    (low.1, low.2),
            high:   (high.1, high.2),
            dead_zone,
        })
    }

    fn apply(&self, live: f64) -> f64 {
        let offset = live - self.middle;
        if offset.abs() < self.dead_zone {
            return 0.0;
        }
        let (extreme, full) = if (self.low.0 - self.middle).signum() == offset.signum() {
            self.low
        } else {
            self.high
        };
        let ratio = offset / (extreme - self.middle);
        full * ratio.min(1.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlMapping
// ════════════════════════════════════════════════════════════════════════════

/// Validated mapping from hand points to axes.  Construction checks every
/// denominator once, so `map` cannot divide by zero.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlMapping {
    thrust: Span,
    yaw:    Deflection,
    pitch:  Deflection,
    roll:   Deflection,
}

impl ControlMapping {
    pub fn new(refs: &ReferenceSet, cfg: &MappingConfig) -> Result<Self, CalibrationError> {
        use ReferencePoint::*;
        let x = |p: ReferencePoint| (p, refs.get(p).x);
        let y = |p: ReferencePoint| (p, refs.get(p).y);
        let with = |(p, v): (ReferencePoint, f64), out: f64| (p, v, out);

        let thrust = Span::new(Axis::Thrust, y(LeftTop), y(LeftBottom), cfg.thrust_full)?;
        let yaw = Deflection::new(
            Axis::Yaw,
            x(LeftMiddle),
            with(x(LeftLeft), -cfg.yaw_limit),
            with(x(LeftRight), cfg.yaw_limit),
            cfg.dead_zone,
        )?;
        let pitch = Deflection::new(
            Axis::Pitch,
            y(RightMiddle),
            with(y(RightBottom), -cfg.pitch_limit),
            with(y(RightTop), cfg.pitch_limit),
            cfg.dead_zone,
        )?;
        let roll = Deflection::new(
            Axis::Roll,
            x(RightMiddle),
            with(x(RightLeft), -cfg.roll_limit),
            with(x(RightRight), cfg.roll_limit),
            cfg.dead_zone,
        )?;

        Ok(ControlMapping { thrust, yaw, pitch, roll })
    }

    /// Map one frame's hand points.  All four axes come from the same frame.
    pub fn map(&self, left: Point2, right: Point2) -> Axes {
        Axes {
            thrust: self.thrust.apply(left.y),
            yaw:    self.yaw.apply(left.x),
            pitch:  self.pitch.apply(right.y),
            roll:   self.roll.apply(right.x),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::References;

    /// Left hand box: middle (100,50), top y=0, bottom y=100, left x=0, right x=200.
    /// Right hand box: middle (400,50), top y=0, bottom y=100, left x=300, right x=500.
    fn refs() -> References {
        use ReferencePoint::*;
        let mut r = References::new();
        r.record(LeftMiddle,  Point2::new(100.0, 50.0));
        r.record(LeftTop,     Point2::new(100.0, 0.0));
        r.record(LeftBottom,  Point2::new(100.0, 100.0));
        r.record(LeftLeft,    Point2::new(0.0, 50.0));
        r.record(LeftRight,   Point2::new(200.0, 50.0));
        r.record(RightMiddle, Point2::new(400.0, 50.0));
        r.record(RightTop,    Point2::new(400.0, 0.0));
        r.record(RightBottom, Point2::new(400.0, 100.0));
        r.record(RightLeft,   Point2::new(300.0, 50.0));
        r.record(RightRight,  Point2::new(500.0, 50.0));
        r
    }

    fn mapping() -> ControlMapping {
        ControlMapping::new(&refs().complete().unwrap(), &MappingConfig::default()).unwrap()
    }

    const RIGHT_REST: Point2 = Point2::new(400.0, 50.0);
    const LEFT_REST:  Point2 = Point2::new(100.0, 50.0);

    #[test]
    fn thrust_halfway() {
        let m = mapping();
        assert_eq!(m.map(Point2::new(100.0, 50.0), RIGHT_REST).thrust, 50.0);
    }

    #[test]
    fn thrust_is_not_clamped() {
        let m = mapping();
        assert_eq!(m.map(Point2::new(100.0, 150.0), RIGHT_REST).thrust, 150.0);
        assert_eq!(m.map(Point2::new(100.0, -20.0), RIGHT_REST).thrust, -20.0);
    }

    #[test]
    fn yaw_midpoint_toward_left_extreme() {
        let m = mapping();
        assert_eq!(m.map(Point2::new(50.0, 50.0), RIGHT_REST).yaw, -100.0);
    }

    #[test]
    fn yaw_toward_right_extreme() {
        let m = mapping();
        assert_eq!(m.map(Point2::new(150.0, 50.0), RIGHT_REST).yaw, 100.0);
        assert_eq!(m.map(Point2::new(200.0, 50.0), RIGHT_REST).yaw, 200.0);
    }

    #[test]
    fn yaw_dead_zone() {
        let m = mapping();
        assert_eq!(m.map(Point2::new(100.0, 50.0), RIGHT_REST).yaw, 0.0);
        assert_eq!(m.map(Point2::new(100.4, 50.0), RIGHT_REST).yaw, 0.0);
        assert_eq!(m.map(Point2::new(99.6, 50.0), RIGHT_REST).yaw, 0.0);
        assert!(m.map(Point2::new(101.0, 50.0), RIGHT_REST).yaw > 0.0);
    }

    #[test]
    fn yaw_saturates_past_extreme() {
        let m = mapping();
        assert_eq!(m.map(Point2::new(-10.0, 50.0), RIGHT_REST).yaw, -200.0);
        assert_eq!(m.map(Point2::new(900.0, 50.0), RIGHT_REST).yaw, 200.0);
    }

    #[test]
    fn yaw_follows_mirrored_calibration() {
        // Sensor image mirrored: LeftLeft learned to the right of the middle.
        let mut r = refs();
        r.record(ReferencePoint::LeftLeft,  Point2::new(200.0, 50.0));
        r.record(ReferencePoint::LeftRight, Point2::new(0.0, 50.0));
        let m = ControlMapping::new(&r.complete().unwrap(), &MappingConfig::default()).unwrap();
        assert_eq!(m.map(Point2::new(150.0, 50.0), RIGHT_REST).yaw, -100.0);
        assert_eq!(m.map(Point2::new(-50.0, 50.0), RIGHT_REST).yaw, 200.0);
    }

    #[test]
    fn pitch_uses_right_hand_only() {
        let m = mapping();
        // Hand raised halfway toward RightTop.
        assert_eq!(m.map(LEFT_REST, Point2::new(400.0, 25.0)).pitch, 15.0);
        // Halfway toward RightBottom.
        assert_eq!(m.map(LEFT_REST, Point2::new(400.0, 75.0)).pitch, -15.0);
        // Moving the left hand must not disturb pitch.
        assert_eq!(m.map(Point2::new(10.0, 95.0), Point2::new(400.0, 75.0)).pitch, -15.0);
    }

    #[test]
    fn pitch_saturates() {
        let m = mapping();
        assert_eq!(m.map(LEFT_REST, Point2::new(400.0, -40.0)).pitch, 30.0);
        assert_eq!(m.map(LEFT_REST, Point2::new(400.0, 400.0)).pitch, -30.0);
    }

    #[test]
    fn roll_both_sides() {
        let m = mapping();
        assert_eq!(m.map(LEFT_REST, Point2::new(350.0, 50.0)).roll, -15.0);
        assert_eq!(m.map(LEFT_REST, Point2::new(450.0, 50.0)).roll, 15.0);
        assert_eq!(m.map(LEFT_REST, Point2::new(250.0, 50.0)).roll, -30.0);
        assert_eq!(m.map(LEFT_REST, RIGHT_REST).roll, 0.0);
    }

    #[test]
    fn custom_limits() {
        let cfg = MappingConfig { yaw_limit: 90.0, ..MappingConfig::default() };
        let m = ControlMapping::new(&refs().complete().unwrap(), &cfg).unwrap();
        assert_eq!(m.map(Point2::new(-10.0, 50.0), RIGHT_REST).yaw, -90.0);
    }

    #[test]
    fn zero_thrust_span_is_rejected() {
        let mut r = refs();
        r.record(ReferencePoint::LeftBottom, Point2::new(100.0, 0.0));
        let err = ControlMapping::new(&r.complete().unwrap(), &MappingConfig::default()).unwrap_err();
        assert_eq!(err, CalibrationError::ZeroSpan {
            axis: Axis::Thrust,
            from: ReferencePoint::LeftTop,
            to:   ReferencePoint::LeftBottom,
        });
    }

    #[test]
    fn extreme_on_middle_is_rejected() {
        let mut r = refs();
        r.record(ReferencePoint::RightLeft, Point2::new(400.0, 50.0));
        let err = ControlMapping::new(&r.complete().unwrap(), &MappingConfig::default()).unwrap_err();
        assert!(matches!(err, CalibrationError::ZeroSpan { axis: Axis::Roll, .. }));
    }

    #[test]
    fn one_sided_extremes_are_rejected() {
        let mut r = refs();
        r.record(ReferencePoint::RightTop, Point2::new(400.0, 90.0));
        let err = ControlMapping::new(&r.complete().unwrap(), &MappingConfig::default()).unwrap_err();
        assert!(matches!(err, CalibrationError::OneSided { axis: Axis::Pitch, .. }));
        assert!(err.to_string().contains("same side"));
    }
}
