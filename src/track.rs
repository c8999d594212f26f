use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::config::MotionNoise;
use crate::error::Error;
use crate::motion::BoxMotionModel;
use crate::Detection;

pub type TrackId = u64;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackState {
    Tentative,
    Confirmed,
    Deleted,
}

/// What the tracker reports for one track in one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub track_id: TrackId,
    #[serde(rename = "class")]
    pub class_label: String,
    pub bbox: BBox<Ltrb>,
    pub confidence: f32,
    pub state: TrackState,
}

#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    class_label: String,
    hits: u32,
    misses: u32,
    state: TrackState,
    confidence: f32,
    // last corrected (or seeding) box
    bbox: BBox<Ltrb>,
    motion: BoxMotionModel,
}

impl Track {
    pub(crate) fn new(id: TrackId, det: &Detection, min_hits: u32, noise: &MotionNoise) -> Self {
        Self {
            id,
            class_label: det.class_label.clone(),
            hits: 1,
            misses: 0,
            state: if min_hits <= 1 {
                TrackState::Confirmed
            } else {
                TrackState::Tentative
            },
            confidence: det.confidence,
            bbox: det.bbox,
            motion: BoxMotionModel::new(&det.bbox, noise),
        }
    }

    #[inline]
    pub(crate) fn predict(&mut self) -> BBox<Ltrb> {
        self.motion.predict()
    }

    pub(crate) fn correct(&mut self, det: &Detection, min_hits: u32) -> Result<(), Error> {
        self.motion.correct(&det.bbox)?;

        self.bbox = self.motion.bbox();
        self.confidence = det.confidence;
        self.hits += 1;
        self.misses = 0;

        if self.state == TrackState::Tentative && self.hits >= min_hits {
            self.state = TrackState::Confirmed;
        }

        Ok(())
    }

    pub(crate) fn mark_missed(&mut self, max_age: u32) {
        self.misses += 1;

        if self.misses > max_age {
            self.state = TrackState::Deleted;
        }
    }

    #[inline]
    pub fn id(&self) -> TrackId {
        self.id
    }

    #[inline]
    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    #[inline]
    pub fn hits(&self) -> u32 {
        self.hits
    }

    #[inline]
    pub fn misses(&self) -> u32 {
        self.misses
    }

    #[inline]
    pub fn state(&self) -> TrackState {
        self.state
    }

    #[inline]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Box from the last correction, or the seeding detection.
    #[inline]
    pub fn bbox(&self) -> BBox<Ltrb> {
        self.bbox
    }

    /// Box of the current filter state, including any coasting predictions.
    #[inline]
    pub fn estimate(&self) -> BBox<Ltrb> {
        self.motion.bbox()
    }

    #[inline]
    pub fn velocity(&self) -> (f32, f32) {
        self.motion.velocity()
    }
}

impl From<&Track> for TrackedObject {
    fn from(t: &Track) -> TrackedObject {
        TrackedObject {
            track_id: t.id,
            class_label: t.class_label.clone(),
            bbox: t.bbox,
            confidence: t.confidence,
            state: t.state,
        }
    }
}
