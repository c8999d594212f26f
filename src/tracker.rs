//! SORT-style multi-object tracker: predict, associate by IoU, correct,
//! spawn and retire, once per frame.

use std::collections::BTreeMap;

use tracing::{debug, error, info, trace};

use crate::assignment::{AssignmentSolver, MunkresSolver};
use crate::bbox::{BBox, Ltrb};
use crate::config::TrackerConfig;
use crate::cost::CostMatrix;
use crate::error::Error;
use crate::track::{Track, TrackId, TrackState, TrackedObject};
use crate::Detection;

pub struct SortTracker<S = MunkresSolver> {
    config: TrackerConfig,
    solver: S,
    tracks: BTreeMap<TrackId, Track>,
    next_id: TrackId,
    frame_count: u64,
    // set once a frame fails part way; cleared only by `reset`
    fault: Option<Error>,
}

impl SortTracker<MunkresSolver> {
    pub fn new(config: TrackerConfig) -> Result<Self, Error> {
        Self::with_solver(config, MunkresSolver)
    }
}

impl<S: AssignmentSolver> SortTracker<S> {
    pub fn with_solver(config: TrackerConfig, solver: S) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            solver,
            tracks: BTreeMap::new(),
            next_id: 0,
            frame_count: 0,
            fault: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Every live track, tentative ones included, in id order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// The error that stopped this tracker, if any.
    #[inline]
    pub fn fault(&self) -> Option<&Error> {
        self.fault.as_ref()
    }

    /// Drops all tracks and clears a fault. Ids keep counting up, so an id
    /// is never handed out twice by the same tracker.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.frame_count = 0;
        self.fault = None;
    }

    /// Processes one frame of detections and returns the confirmed tracks.
    ///
    /// When no track exists yet, every detection seeds a track and the new
    /// tracks are returned as they are, tentative ones included.
    ///
    /// Malformed detections are rejected before any state changes. A filter
    /// or solver failure leaves the tracks part way through the frame, so the
    /// tracker keeps returning that error until [`reset`](Self::reset).
    pub fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackedObject>, Error> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }

        for (index, det) in detections.iter().enumerate() {
            det.validate()
                .map_err(|reason| Error::InvalidDetection { index, reason })?;
        }

        self.advance(detections).map_err(|err| {
            error!(frame = self.frame_count, %err, "tracker failed, reset required");
            self.fault = Some(err.clone());
            err
        })
    }

    fn advance(&mut self, detections: &[Detection]) -> Result<Vec<TrackedObject>, Error> {
        self.frame_count += 1;

        if self.tracks.is_empty() {
            let spawned: Vec<TrackId> = detections.iter().map(|d| self.spawn(d)).collect();

            debug!(
                frame = self.frame_count,
                spawned = spawned.len(),
                "seeded tracks"
            );

            return Ok(spawned
                .iter()
                .filter_map(|id| self.tracks.get(id))
                .map(Into::into)
                .collect());
        }

        let ids: Vec<TrackId> = self.tracks.keys().copied().collect();
        let predicted: Vec<BBox<Ltrb>> = self.tracks.values_mut().map(Track::predict).collect();
        let boxes: Vec<BBox<Ltrb>> = detections.iter().map(|d| d.bbox).collect();

        let affinity = CostMatrix::iou(&predicted, &boxes);
        let pairs = if affinity.is_empty() {
            Vec::new()
        } else {
            self.solver.solve(&affinity)?
        };

        let mut track_matched = vec![false; ids.len()];
        let mut det_matched = vec![false; detections.len()];

        for (row, col) in pairs {
            let iou = match affinity.get(row, col) {
                Some(iou) => iou,
                None => continue,
            };

            if iou < self.config.iou_threshold {
                trace!(track = ids[row], detection = col, iou, "match rejected");
                continue;
            }

            if let Some(track) = self.tracks.get_mut(&ids[row]) {
                let was = track.state();
                track.correct(&detections[col], self.config.min_hits)?;

                if was == TrackState::Tentative && track.state() == TrackState::Confirmed {
                    info!(track = track.id(), class = track.class_label(), "track confirmed");
                }
            }

            trace!(track = ids[row], detection = col, iou, "matched");
            track_matched[row] = true;
            det_matched[col] = true;
        }

        for (row, id) in ids.iter().enumerate() {
            if !track_matched[row] {
                if let Some(track) = self.tracks.get_mut(id) {
                    track.mark_missed(self.config.max_age);
                }
            }
        }

        let mut spawned = 0;
        for (det, _) in detections
            .iter()
            .zip(det_matched.iter())
            .filter(|(_, &matched)| !matched)
        {
            self.spawn(det);
            spawned += 1;
        }

        let before = self.tracks.len();
        self.tracks.retain(|_, t| {
            if t.state() == TrackState::Deleted {
                info!(track = t.id(), misses = t.misses(), "track deleted");
                false
            } else {
                true
            }
        });

        debug!(
            frame = self.frame_count,
            detections = detections.len(),
            matched = track_matched.iter().filter(|&&m| m).count(),
            spawned,
            deleted = before - self.tracks.len(),
            live = self.tracks.len(),
            "frame processed"
        );

        let min_hits = self.config.min_hits;
        Ok(self
            .tracks
            .values()
            .filter(|t| t.hits() >= min_hits)
            .map(Into::into)
            .collect())
    }

    fn spawn(&mut self, det: &Detection) -> TrackId {
        let id = self.next_id;
        self.next_id += 1;

        let track = Track::new(id, det, self.config.min_hits, &self.config.noise);
        self.tracks.insert(id, track);

        trace!(track = id, class = %det.class_label, "track spawned");
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::GreedySolver;
    use crate::config::MotionNoise;

    fn player(x1: f32, y1: f32) -> Detection {
        Detection::new("player", 0.9, BBox::ltrb(x1, y1, x1 + 50.0, y1 + 50.0))
    }

    #[test]
    fn test_bootstrap_returns_tentative_tracks() {
        let mut tracker = SortTracker::new(TrackerConfig::default()).unwrap();
        let out = tracker
            .update(&[player(100.0, 100.0), player(300.0, 100.0)])
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].track_id, 0);
        assert_eq!(out[1].track_id, 1);
        assert!(out.iter().all(|o| o.state == TrackState::Tentative));
        assert_eq!(out[0].bbox, BBox::ltrb(100.0, 100.0, 150.0, 150.0));
    }

    #[test]
    fn test_empty_frame_ages_tracks() {
        let mut tracker = SortTracker::new(TrackerConfig::default()).unwrap();
        tracker.update(&[player(100.0, 100.0)]).unwrap();

        assert!(tracker.update(&[]).unwrap().is_empty());
        assert_eq!(tracker.tracks().next().unwrap().misses(), 1);

        tracker.update(&[]).unwrap();
        assert_eq!(tracker.tracks().count(), 0);
    }

    #[test]
    fn test_low_iou_match_is_demoted() {
        let config = TrackerConfig {
            iou_threshold: 0.9,
            ..Default::default()
        };
        let mut tracker = SortTracker::new(config).unwrap();
        tracker.update(&[player(100.0, 100.0)]).unwrap();

        // IoU ~0.67 with the prediction: both sides stay unmatched
        tracker.update(&[player(110.0, 100.0)]).unwrap();

        let tracks: Vec<_> = tracker.tracks().collect();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].misses(), 1);
        assert_eq!(tracks[0].hits(), 1);
        assert_eq!(tracks[1].id(), 1);
    }

    #[test]
    fn test_confidence_follows_matched_detection() {
        let config = TrackerConfig {
            min_hits: 1,
            max_age: 3,
            ..Default::default()
        };
        let mut tracker = SortTracker::new(config).unwrap();
        tracker.update(&[player(100.0, 100.0)]).unwrap();

        let mut det = player(101.0, 100.0);
        det.confidence = 0.42;
        let out = tracker.update(&[det]).unwrap();
        assert_eq!(out[0].confidence, 0.42);

        let out = tracker.update(&[]).unwrap();
        assert_eq!(out[0].confidence, 0.42);
    }

    #[test]
    fn test_rejects_malformed_detection() {
        let mut tracker = SortTracker::new(TrackerConfig::default()).unwrap();
        let bad = Detection::new("player", 0.9, BBox::ltrb(10.0, 10.0, 5.0, 20.0));

        let err = tracker.update(&[player(0.0, 0.0), bad]).unwrap_err();
        assert!(matches!(err, Error::InvalidDetection { index: 1, .. }));
        assert_eq!(tracker.frame_count(), 0);
        assert_eq!(tracker.tracks().count(), 0);
    }

    #[test]
    fn test_ids_keep_increasing_after_reset() {
        let mut tracker = SortTracker::new(TrackerConfig::default()).unwrap();
        tracker.update(&[player(100.0, 100.0)]).unwrap();
        tracker.update(&[player(400.0, 400.0)]).unwrap();
        assert_eq!(tracker.tracks().last().unwrap().id(), 1);

        tracker.reset();
        assert_eq!(tracker.tracks().count(), 0);
        assert_eq!(tracker.frame_count(), 0);

        let out = tracker.update(&[player(500.0, 100.0)]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_id, 2);
    }

    #[test]
    fn test_filter_failure_stops_tracker_until_reset() {
        // variances this small underflow the determinant of S to zero
        let tiny = 1e-30;
        let config = TrackerConfig {
            noise: MotionNoise {
                initial_position_var: tiny,
                initial_velocity_var: tiny,
                process_position_var: tiny,
                process_velocity_var: tiny,
                measurement_var: tiny,
            },
            ..Default::default()
        };
        let mut tracker = SortTracker::new(config).unwrap();
        tracker.update(&[player(100.0, 100.0)]).unwrap();
        assert!(tracker.fault().is_none());

        let err = tracker.update(&[player(100.0, 100.0)]).unwrap_err();
        assert!(matches!(err, Error::SingularCovariance));
        assert!(matches!(tracker.fault(), Some(Error::SingularCovariance)));

        let frames = tracker.frame_count();
        assert!(matches!(
            tracker.update(&[]),
            Err(Error::SingularCovariance)
        ));
        assert_eq!(tracker.frame_count(), frames);

        tracker.reset();
        assert!(tracker.fault().is_none());
        let out = tracker.update(&[player(300.0, 100.0)]).unwrap();
        assert_eq!(out[0].track_id, 1);
    }

    #[test]
    fn test_greedy_solver_tracks_separated_objects() {
        let mut tracker =
            SortTracker::with_solver(TrackerConfig::default(), GreedySolver).unwrap();

        let mut out = Vec::new();
        for i in 0..4 {
            let dx = 2.0 * i as f32;
            out = tracker
                .update(&[player(100.0 + dx, 100.0), player(400.0 - dx, 300.0)])
                .unwrap();
        }

        let ids: Vec<_> = out.iter().map(|o| o.track_id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(out.iter().all(|o| o.state == TrackState::Confirmed));
    }
}
