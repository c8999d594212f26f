pub mod assignment;
pub mod ball;
pub mod bbox;
pub mod config;
pub mod cost;
pub mod detection;
pub mod error;
pub mod frame;
pub mod kalman;
pub mod motion;
pub mod track;
pub mod tracker;

pub use ball::{BallTracker, Position3D};
pub use config::{BallTrackerConfig, FieldTrackerConfig, TrackerConfig};
pub use detection::Detection;
pub use frame::{Frame, FrameTracks};
pub use track::{Track, TrackId, TrackState, TrackedObject};
pub use tracker::SortTracker;

use assignment::{AssignmentSolver, MunkresSolver};
use error::Error;
use tracing::debug;

/// Frame-sequential tracking: one `update` per frame, in order.
pub trait Tracking {
    fn update(&mut self, frame: &Frame) -> Result<FrameTracks, Error>;
    fn reset(&mut self);
}

/// Tracks players and other objects with a [`SortTracker`] and the ball with a
/// [`BallTracker`], routing each detection by its class label.
pub struct FieldTracker<S = MunkresSolver> {
    ball_label: String,
    objects: SortTracker<S>,
    ball: BallTracker,
}

impl FieldTracker<MunkresSolver> {
    pub fn new(config: FieldTrackerConfig) -> Result<Self, Error> {
        Self::with_solver(config, MunkresSolver)
    }
}

impl<S: AssignmentSolver> FieldTracker<S> {
    pub fn with_solver(config: FieldTrackerConfig, solver: S) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            ball_label: config.ball_label,
            objects: SortTracker::with_solver(config.objects, solver)?,
            ball: BallTracker::new(config.ball)?,
        })
    }

    #[inline]
    pub fn objects(&self) -> &SortTracker<S> {
        &self.objects
    }

    #[inline]
    pub fn ball(&self) -> &BallTracker {
        &self.ball
    }
}

impl<S: AssignmentSolver> Tracking for FieldTracker<S> {
    fn update(&mut self, frame: &Frame) -> Result<FrameTracks, Error> {
        // a bad detection must fail the frame before either tracker moves
        for (index, det) in frame.iter().enumerate() {
            det.validate()
                .map_err(|reason| Error::InvalidDetection { index, reason })?;
        }

        let mut ball = None;
        let mut others = Vec::with_capacity(frame.len());

        // the detector reports at most one ball; if not, the last one wins
        for det in frame.iter() {
            if det.class_label == self.ball_label {
                ball = Some(det);
            } else {
                others.push(det.clone());
            }
        }

        debug!(
            timestamp = frame.timestamp,
            objects = others.len(),
            ball = ball.is_some(),
            "routing frame"
        );

        let objects = self.objects.update(&others)?;
        let ball = self.ball.update(ball)?;

        Ok(FrameTracks {
            timestamp: frame.timestamp,
            objects,
            ball,
        })
    }

    fn reset(&mut self) {
        self.objects.reset();
        self.ball.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    #[test]
    fn test_routes_ball_by_label() {
        let mut tracker = FieldTracker::new(FieldTrackerConfig::default()).unwrap();
        let frame = Frame::new(
            12.5,
            vec![
                Detection::new("player", 0.9, BBox::ltrb(100.0, 100.0, 150.0, 200.0)),
                Detection::new("ball", 0.8, BBox::ltrb(50.0, 31.5, 55.0, 36.5)),
            ],
        );

        let out = tracker.update(&frame).unwrap();
        assert_eq!(out.timestamp, 12.5);
        assert_eq!(out.objects.len(), 1);
        assert_eq!(out.objects[0].class_label, "player");
        assert_eq!(out.ball, Some(Position3D::new(52.5, 34.0, 0.0)));
        assert_eq!(tracker.objects().tracks().count(), 1);
    }

    #[test]
    fn test_custom_ball_label() {
        let config = FieldTrackerConfig {
            ball_label: "sports ball".into(),
            ..Default::default()
        };
        let mut tracker = FieldTracker::new(config).unwrap();
        let frame = Frame::new(
            0.0,
            vec![Detection::new("ball", 0.8, BBox::ltrb(0.0, 0.0, 4.0, 4.0))],
        );

        let out = tracker.update(&frame).unwrap();
        assert_eq!(out.ball, None);
        assert_eq!(out.objects.len(), 1);
    }

    #[test]
    fn test_malformed_ball_fails_frame_untouched() {
        let mut tracker = FieldTracker::new(FieldTrackerConfig::default()).unwrap();
        let frame = Frame::new(
            0.0,
            vec![
                Detection::new("player", 0.9, BBox::ltrb(100.0, 100.0, 150.0, 200.0)),
                Detection::new("ball", 1.5, BBox::ltrb(50.0, 31.5, 55.0, 36.5)),
            ],
        );

        let err = tracker.update(&frame).unwrap_err();
        assert!(matches!(err, Error::InvalidDetection { index: 1, .. }));
        assert_eq!(tracker.objects().tracks().count(), 0);
        assert_eq!(tracker.objects().frame_count(), 0);
        assert!(!tracker.ball().is_initialized());
    }

    #[test]
    fn test_reset_clears_both_trackers() {
        let mut tracker = FieldTracker::new(FieldTrackerConfig::default()).unwrap();
        let frame = Frame::new(
            0.0,
            vec![
                Detection::new("player", 0.9, BBox::ltrb(0.0, 0.0, 10.0, 20.0)),
                Detection::new("ball", 0.9, BBox::ltrb(30.0, 30.0, 34.0, 34.0)),
            ],
        );
        tracker.update(&frame).unwrap();

        tracker.reset();
        assert_eq!(tracker.objects().tracks().count(), 0);
        assert!(!tracker.ball().is_initialized());
    }
}
