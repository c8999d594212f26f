use serde_derive::{Deserialize, Serialize};

use crate::ball::Position3D;
use crate::detection::Detection;
use crate::track::TrackedObject;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    pub detections: Vec<Detection>,
    pub timestamp: f64, // in seconds, passed through untouched
}

impl Frame {
    #[inline]
    pub fn new(timestamp: f64, detections: Vec<Detection>) -> Self {
        Self {
            detections,
            timestamp,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Tracker output for one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameTracks {
    pub timestamp: f64,
    pub objects: Vec<TrackedObject>,
    pub ball: Option<Position3D>,
}
