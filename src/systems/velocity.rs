use nalgebra::Vector2;

use crate::{error::TrackingError, geometry_utils::Point};

/// Per-identity bookkeeping of a sampled displacement (`dir_vec`) and the
/// remaining offset to a target flag (`flag_vec`).
///
/// Fields start unset; callers set the start, then the end (and a target flag)
/// before calling [`VelocityTracker::update_vectors`].
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    vec_start: Option<Point>,
    vec_end: Option<Point>,
    target_flag: Option<Point>,
    dir_vec: Option<Vector2<f32>>,
    flag_vec: Option<Vector2<f32>>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        VelocityTracker::default()
    }

    pub fn set_target(&mut self, flag: Point) {
        self.target_flag = Some(flag);
    }

    pub fn set_vector_start(&mut self, position: Point) {
        self.vec_start = Some(position);
    }

    pub fn set_vector_end(&mut self, position: Point) {
        self.vec_end = Some(position);
    }

    /// `dir_vec = vec_end - vec_start`, `flag_vec = target_flag - vec_end`
    pub fn update_vectors(&mut self) -> Result<(), TrackingError> {
        let start = self
            .vec_start
            .ok_or(TrackingError::VectorsNotReady("start"))?;
        let end = self.vec_end.ok_or(TrackingError::VectorsNotReady("end"))?;
        let flag = self
            .target_flag
            .ok_or(TrackingError::VectorsNotReady("target flag"))?;

        self.dir_vec = Some(end - start);
        self.flag_vec = Some(flag - end);
        Ok(())
    }

    pub fn dir_vec(&self) -> Result<Vector2<f32>, TrackingError> {
        self.dir_vec.ok_or(TrackingError::VectorsNotComputed)
    }

    pub fn flag_vec(&self) -> Result<Vector2<f32>, TrackingError> {
        self.flag_vec.ok_or(TrackingError::VectorsNotComputed)
    }

    pub fn vec_start(&self) -> Option<Point> {
        self.vec_start
    }

    pub fn vec_end(&self) -> Option<Point> {
        self.vec_end
    }

    pub fn target_flag(&self) -> Option<Point> {
        self.target_flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_before_update_fails_loudly() {
        let tracker = VelocityTracker::new();
        assert_eq!(tracker.dir_vec(), Err(TrackingError::VectorsNotComputed));
        assert_eq!(tracker.flag_vec(), Err(TrackingError::VectorsNotComputed));
    }

    #[test]
    fn test_update_requires_start_end_and_flag() {
        let mut tracker = VelocityTracker::new();
        assert_eq!(
            tracker.update_vectors(),
            Err(TrackingError::VectorsNotReady("start"))
        );
        tracker.set_vector_start(Point::new(0., 0.));
        assert_eq!(
            tracker.update_vectors(),
            Err(TrackingError::VectorsNotReady("end"))
        );
        tracker.set_vector_end(Point::new(1., 1.));
        assert_eq!(
            tracker.update_vectors(),
            Err(TrackingError::VectorsNotReady("target flag"))
        );
        // Still nothing computed after the failed attempts
        assert!(tracker.dir_vec().is_err());
    }

    #[test]
    fn test_vectors() {
        let mut tracker = VelocityTracker::new();
        tracker.set_target(Point::new(100., 50.));
        tracker.set_vector_start(Point::new(10., 10.));
        tracker.set_vector_end(Point::new(20., 5.));
        tracker.update_vectors().unwrap();

        assert_eq!(tracker.dir_vec().unwrap(), Vector2::new(10., -5.));
        assert_eq!(tracker.flag_vec().unwrap(), Vector2::new(80., 45.));
    }
}
