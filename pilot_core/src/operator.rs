//! Operator lock-on.
//!
//! Picks the single person in front of the sensor and remembers their
//! tracking id for the rest of the calibration/tracking cycle.  Nobody is
//! selected while zero or several bodies are tracked: the operator has to be
//! alone in frame to begin.

use crate::body::TrackedBody;

#[derive(Debug, Default)]
pub struct OperatorLock {
    locked: Option<u64>,
}

impl OperatorLock {
    pub fn new() -> Self { OperatorLock::default() }

    /// Look for exactly one tracked body and lock onto it.
    ///
    /// Returns the selected id, or `None` when the frame holds zero or more
    /// than one tracked body.  A previous lock is kept in the latter case so a
    /// bystander stepping in does not reset the selection.
    pub fn search(&mut self, bodies: &[TrackedBody]) -> Option<u64> {
        let mut tracked = bodies.iter().filter(|b| b.is_tracked);
        match (tracked.next(), tracked.next()) {
            (Some(only), None) => {
                if self.locked != Some(only.tracking_id) {
                    tracing::debug!(tracking_id = only.tracking_id, "operator candidate locked");
                }
                self.locked = Some(only.tracking_id);
                Some(only.tracking_id)
            }
            _ => None,
        }
    }

    /// Find the locked operator in this frame, ignoring everybody else.
    pub fn locate<'a>(&self, bodies: &'a [TrackedBody]) -> Option<&'a TrackedBody> {
        let id = self.locked?;
        bodies.iter().find(|b| b.is_tracked && b.tracking_id == id)
    }

    pub fn operator(&self) -> Option<u64> { self.locked }

    pub fn release(&mut self) {
        if let Some(id) = self.locked.take() {
            tracing::debug!(tracking_id = id, "operator released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ids: &[(u64, bool)]) -> Vec<TrackedBody> {
        ids.iter()
            .map(|&(id, tracked)| if tracked { TrackedBody::new(id) } else { TrackedBody::untracked(id) })
            .collect()
    }

    #[test]
    fn single_tracked_body_is_selected() {
        let mut lock = OperatorLock::new();
        let bodies = frame(&[(3, false), (7, true), (9, false)]);
        assert_eq!(lock.search(&bodies), Some(7));
        assert_eq!(lock.operator(), Some(7));
    }

    #[test]
    fn empty_frame_selects_nobody() {
        let mut lock = OperatorLock::new();
        assert_eq!(lock.search(&frame(&[(1, false)])), None);
        assert_eq!(lock.operator(), None);
    }

    #[test]
    fn crowd_selects_nobody() {
        let mut lock = OperatorLock::new();
        assert_eq!(lock.search(&frame(&[(1, true), (2, true)])), None);
    }

    #[test]
    fn locate_ignores_body_count() {
        let mut lock = OperatorLock::new();
        lock.search(&frame(&[(5, true)]));
        let crowd = frame(&[(4, true), (5, true), (6, true)]);
        assert_eq!(lock.locate(&crowd).map(|b| b.tracking_id), Some(5));
    }

    #[test]
    fn locate_misses_when_operator_left() {
        let mut lock = OperatorLock::new();
        lock.search(&frame(&[(5, true)]));
        assert!(lock.locate(&frame(&[(6, true)])).is_none());
        assert!(lock.locate(&frame(&[(5, false)])).is_none());
    }

    #[test]
    fn release_clears_lock() {
        let mut lock = OperatorLock::new();
        lock.search(&frame(&[(5, true)]));
        lock.release();
        assert_eq!(lock.operator(), None);
        assert!(lock.locate(&frame(&[(5, true)])).is_none());
    }
}
