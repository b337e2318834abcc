//! Points in sensor space and in the shared planar reference frame.

use serde::{Deserialize, Serialize};

/// A point in the 2-D reference frame (display space: x right, y down).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self { Point2 { x, y } }
}

/// A joint position in sensor (camera) space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self { Point3 { x, y, z } }
}

// ════════════════════════════════════════════════════════════════════════════
// Projector
// ════════════════════════════════════════════════════════════════════════════

/// Maps a sensor-space joint position into the shared reference frame.
///
/// Implementations must be pure: the same input always yields the same point.
pub trait Projector: Send {
    fn project(&self, p: Point3) -> Point2;
}

impl<F> Projector for F
where
    F: Fn(Point3) -> Point2 + Send,
{
    fn project(&self, p: Point3) -> Point2 { self(p) }
}

/// Linear orthographic projection.  Sensor x grows to the right; with
/// `flip_y` set, sensor y grows upward while display y grows downward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenProjector {
    /// Display units per sensor unit.
    pub scale:    f64,
    pub origin_x: f64,
    pub origin_y: f64,
    #[serde(default = "flip_y_default")]
    pub flip_y:   bool,
}

fn flip_y_default() -> bool { true }

impl ScreenProjector {
    /// Camera-space projection, y flipped.
    pub fn new(scale: f64, origin_x: f64, origin_y: f64) -> Self {
        ScreenProjector { scale, origin_x, origin_y, flip_y: true }
    }

    /// Pass-through for sources that already report display coordinates
    /// (y down) in `x`/`y`.
    pub fn identity() -> Self {
        ScreenProjector { scale: 1.0, origin_x: 0.0, origin_y: 0.0, flip_y: false }
    }
}

impl Projector for ScreenProjector {
    fn project(&self, p: Point3) -> Point2 {
        let dy = p.y * self.scale;
        Point2::new(
            self.origin_x + p.x * self.scale,
            if self.flip_y { self.origin_y - dy } else { self.origin_y + dy },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_passes_xy_through() {
        let p = ScreenProjector::identity().project(Point3::new(12.0, 34.0, 900.0));
        assert_eq!(p, Point2::new(12.0, 34.0));
    }

    #[test]
    fn screen_projection_flips_y() {
        let proj = ScreenProjector::new(2.0, 400.0, 300.0);
        let p = proj.project(Point3::new(10.0, 50.0, 0.0));
        assert_eq!(p, Point2::new(420.0, 200.0));
    }

    #[test]
    fn unit_scale_at_origin_still_flips() {
        let p = ScreenProjector::new(1.0, 0.0, 0.0).project(Point3::new(10.0, 50.0, 0.0));
        assert_eq!(p, Point2::new(10.0, -50.0));
        let q = ScreenProjector::new(1.0, 0.0, 1e-9).project(Point3::new(10.0, 50.0, 0.0));
        assert!((q.y - p.y).abs() < 1e-6);
    }

    #[test]
    fn closures_are_projectors() {
        let proj = |p: Point3| Point2::new(p.z, p.x);
        assert_eq!(proj.project(Point3::new(1.0, 2.0, 3.0)), Point2::new(3.0, 1.0));
    }
}
