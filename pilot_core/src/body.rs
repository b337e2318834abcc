//! Tracked bodies as delivered by a sensor, one set per frame.

use std::collections::HashMap;

use crate::geometry::Point3;

/// Skeleton joints the core knows how to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointName {
    Head,
    SpineBase,
    HandLeft,
    HandRight,
}

/// Which of the operator's hands a reference point or axis belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn joint(self) -> JointName {
        match self {
            Hand::Left  => JointName::HandLeft,
            Hand::Right => JointName::HandRight,
        }
    }
}

/// One body in a sensor frame.  Read-only to the core.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedBody {
    pub tracking_id: u64,
    pub is_tracked:  bool,
    pub joints:      HashMap<JointName, Point3>,
}

impl TrackedBody {
    pub fn new(tracking_id: u64) -> Self {
        TrackedBody { tracking_id, is_tracked: true, joints: HashMap::new() }
    }

    /// A body slot the sensor reports but is not currently tracking.
    pub fn untracked(tracking_id: u64) -> Self {
        TrackedBody { tracking_id, is_tracked: false, joints: HashMap::new() }
    }

    pub fn with_joint(mut self, joint: JointName, position: Point3) -> Self {
        self.joints.insert(joint, position);
        self
    }

    pub fn joint(&self, joint: JointName) -> Option<Point3> {
        self.joints.get(&joint).copied()
    }

    pub fn hand(&self, hand: Hand) -> Option<Point3> {
        self.joint(hand.joint())
    }
}
