//! Calibration states and the ten learned reference points.
//!
//! The operator is walked through a fixed order of poses: search for a lone
//! operator, then learn five left-hand positions and five right-hand
//! positions, then track.

use crate::body::Hand;
use crate::error::CalibrationError;
use crate::geometry::Point2;

// ════════════════════════════════════════════════════════════════════════════
// ReferencePoint
// ════════════════════════════════════════════════════════════════════════════

/// The ten calibrated hand poses, in learning order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferencePoint {
    LeftMiddle,
    LeftTop,
    LeftBottom,
    LeftLeft,
    LeftRight,
    RightMiddle,
    RightTop,
    RightBottom,
    RightLeft,
    RightRight,
}

impl ReferencePoint {
    pub const ALL: [ReferencePoint; 10] = [
        ReferencePoint::LeftMiddle,
        ReferencePoint::LeftTop,
        ReferencePoint::LeftBottom,
        ReferencePoint::LeftLeft,
        ReferencePoint::LeftRight,
        ReferencePoint::RightMiddle,
        ReferencePoint::RightTop,
        ReferencePoint::RightBottom,
        ReferencePoint::RightLeft,
        ReferencePoint::RightRight,
    ];

    pub fn index(self) -> usize { self as usize }

    /// The hand whose joint is sampled while learning this point.
    pub fn hand(self) -> Hand {
        match self {
            ReferencePoint::LeftMiddle
            | ReferencePoint::LeftTop
            | ReferencePoint::LeftBottom
            | ReferencePoint::LeftLeft
            | ReferencePoint::LeftRight => Hand::Left,
            ReferencePoint::RightMiddle
            | ReferencePoint::RightTop
            | ReferencePoint::RightBottom
            | ReferencePoint::RightLeft
            | ReferencePoint::RightRight => Hand::Right,
        }
    }

    /// The point learned after this one, `None` after `RightRight`.
    pub fn next(self) -> Option<ReferencePoint> {
        ReferencePoint::ALL.get(self.index() + 1).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            ReferencePoint::LeftMiddle  => "Left Hand Middle",
            ReferencePoint::LeftTop     => "Left Hand Top",
            ReferencePoint::LeftBottom  => "Left Hand Bottom",
            ReferencePoint::LeftLeft    => "Left Hand Left",
            ReferencePoint::LeftRight   => "Left Hand Right",
            ReferencePoint::RightMiddle => "Right Hand Middle",
            ReferencePoint::RightTop    => "Right Hand Top",
            ReferencePoint::RightBottom => "Right Hand Bottom",
            ReferencePoint::RightLeft   => "Right Hand Left",
            ReferencePoint::RightRight  => "Right Hand Right",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackingState
// ════════════════════════════════════════════════════════════════════════════

/// Where the operator is in the calibration/tracking cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TrackingState {
    #[default]
    Idle,
    Searching,
    Learn(ReferencePoint),
    Tracking,
}

impl TrackingState {
    /// The state `advance` moves to.  `Tracking` is terminal and maps to itself.
    pub fn next(self) -> TrackingState {
        match self {
            TrackingState::Idle      => TrackingState::Searching,
            TrackingState::Searching => TrackingState::Learn(ReferencePoint::LeftMiddle),
            TrackingState::Learn(p)  => match p.next() {
                Some(n) => TrackingState::Learn(n),
                None    => TrackingState::Tracking,
            },
            TrackingState::Tracking  => TrackingState::Tracking,
        }
    }

    /// Operator-facing prompt for the current step.
    pub fn label(self) -> String {
        match self {
            TrackingState::Idle      => "Search for Operator".to_string(),
            TrackingState::Searching => "Searching for Operator".to_string(),
            TrackingState::Learn(p)  => format!("Learn {}", p.label()),
            TrackingState::Tracking  => "Tracking...".to_string(),
        }
    }

    pub fn is_learning(self) -> bool { matches!(self, TrackingState::Learn(_)) }
}

// ════════════════════════════════════════════════════════════════════════════
// References: the ten slots, filled during learning
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq)]
pub struct References {
    slots: [Option<Point2>; 10],
}

impl References {
    pub fn new() -> Self { References::default() }

    pub fn record(&mut self, point: ReferencePoint, at: Point2) {
        self.slots[point.index()] = Some(at);
    }

    pub fn get(&self, point: ReferencePoint) -> Option<Point2> {
        self.slots[point.index()]
    }

    pub fn clear(&mut self) {
        self.slots = [None; 10];
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Recorded points paired with their names, for display.
    pub fn recorded(&self) -> impl Iterator<Item = (ReferencePoint, Point2)> + '_ {
        ReferencePoint::ALL.iter().filter_map(move |&p| self.get(p).map(|at| (p, at)))
    }

    /// Freeze a fully populated set.
    pub fn complete(&self) -> Result<ReferenceSet, CalibrationError> {
        let mut points = [Point2::default(); 10];
        for p in ReferencePoint::ALL {
            points[p.index()] = self.get(p).ok_or(CalibrationError::Missing(p))?;
        }
        Ok(ReferenceSet { points })
    }
}

/// All ten reference points, guaranteed present.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceSet {
    points: [Point2; 10],
}

impl ReferenceSet {
    pub fn get(&self, point: ReferencePoint) -> Point2 {
        self.points[point.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_state_order() {
        let mut state = TrackingState::Idle;
        let mut visited = vec![state];
        while state != TrackingState::Tracking {
            state = state.next();
            visited.push(state);
        }
        assert_eq!(visited.len(), 13);
        assert_eq!(visited[1], TrackingState::Searching);
        assert_eq!(visited[2], TrackingState::Learn(ReferencePoint::LeftMiddle));
        assert_eq!(visited[11], TrackingState::Learn(ReferencePoint::RightRight));
        for (i, p) in ReferencePoint::ALL.iter().enumerate() {
            assert_eq!(visited[i + 2], TrackingState::Learn(*p));
        }
    }

    #[test]
    fn tracking_is_terminal() {
        assert_eq!(TrackingState::Tracking.next(), TrackingState::Tracking);
    }

    #[test]
    fn hands_follow_point_names() {
        assert!(ReferencePoint::ALL[..5].iter().all(|p| p.hand() == Hand::Left));
        assert!(ReferencePoint::ALL[5..].iter().all(|p| p.hand() == Hand::Right));
    }

    #[test]
    fn labels_match_prompts() {
        assert_eq!(TrackingState::Idle.label(), "Search for Operator");
        assert_eq!(TrackingState::Learn(ReferencePoint::RightBottom).label(), "Learn Right Hand Bottom");
        assert_eq!(TrackingState::Tracking.label(), "Tracking...");
    }

    #[test]
    fn incomplete_references_name_the_gap() {
        let mut refs = References::new();
        for p in ReferencePoint::ALL.iter().take(4) {
            refs.record(*p, Point2::new(1.0, 1.0));
        }
        assert!(!refs.is_complete());
        assert_eq!(refs.complete(), Err(CalibrationError::Missing(ReferencePoint::LeftRight)));
    }

    #[test]
    fn complete_references_freeze() {
        let mut refs = References::new();
        for (i, p) in ReferencePoint::ALL.iter().enumerate() {
            refs.record(*p, Point2::new(i as f64, 0.0));
        }
        let set = refs.complete().unwrap();
        assert_eq!(set.get(ReferencePoint::RightTop), Point2::new(6.0, 0.0));
        refs.clear();
        assert_eq!(refs.recorded().count(), 0);
    }
}
