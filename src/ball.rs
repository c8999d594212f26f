//! Single-target tracker for the ball.
//!
//! Constant-acceleration model over `[x, y, z, vx, vy, vz, ax, ay, az]` with
//! unit time step; only position is observed. The ball is small, fast and
//! often missed by the detector, so the track coasts on predictions for up to
//! `max_lost_frames` frames before it is dropped.

use nalgebra::{SMatrix, SVector, Vector3};
use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BallTrackerConfig;
use crate::error::Error;
use crate::kalman::KalmanFilter;
use crate::Detection;

const STATE_DIM: usize = 9;
const MEASUREMENT_DIM: usize = 3;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3D {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<Vector3<f32>> for Position3D {
    fn from(v: Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Snapshot of an initialized ball track.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BallState {
    pub position: Position3D,
    pub velocity: Vector3<f32>,
    pub acceleration: Vector3<f32>,
    pub lost_frames: u32,
}

#[derive(Debug, Clone)]
pub struct BallTracker {
    config: BallTrackerConfig,
    kf: KalmanFilter<STATE_DIM, MEASUREMENT_DIM>,
    lost_frames: u32,
    initialized: bool,
}

impl BallTracker {
    pub fn new(config: BallTrackerConfig) -> Result<Self, Error> {
        config.validate()?;

        let kf = filter(&config);

        Ok(Self {
            config,
            kf,
            lost_frames: 0,
            initialized: false,
        })
    }

    #[inline]
    pub fn config(&self) -> &BallTrackerConfig {
        &self.config
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn lost_frames(&self) -> u32 {
        self.lost_frames
    }

    pub fn reset(&mut self) {
        self.kf = filter(&self.config);
        self.lost_frames = 0;
        self.initialized = false;
    }

    /// Feeds this frame's ball detection, if any.
    ///
    /// Missing and low-confidence detections fall back to [`predict`](Self::predict).
    /// A detection arriving while the track is down seeds a new one at the
    /// measured position with zero velocity and acceleration; otherwise the
    /// filter is corrected with the box centre. Only coasting advances the
    /// filter in time.
    pub fn update(&mut self, detection: Option<&Detection>) -> Result<Option<Position3D>, Error> {
        let det = match detection {
            Some(det) => det,
            None => return Ok(self.predict()),
        };

        det.validate()
            .map_err(|reason| Error::InvalidDetection { index: 0, reason })?;

        if det.confidence < self.config.min_confidence {
            return Ok(self.predict());
        }

        let (x, y) = det.bbox.center();
        let z = Vector3::new(x, y, det.z.unwrap_or(0.0));

        if self.initialized {
            self.kf.correct(&z)?;
            self.clamp_acceleration();
        } else {
            self.kf = filter(&self.config);
            self.kf.x.fixed_rows_mut::<3>(0).copy_from(&z);
            self.initialized = true;

            info!(x, y, z = z.z, "ball track initialized");
        }

        self.lost_frames = 0;

        Ok(Some(self.position()))
    }

    /// Coasts one frame without a measurement.
    ///
    /// Returns `None` when there is no track, and also on the frame the track
    /// is dropped for having been lost longer than `max_lost_frames`.
    pub fn predict(&mut self) -> Option<Position3D> {
        if !self.initialized {
            return None;
        }

        self.kf.predict();
        self.lost_frames += 1;

        if self.lost_frames > self.config.max_lost_frames {
            self.initialized = false;
            info!(lost_frames = self.lost_frames, "ball track lost");
            return None;
        }

        debug!(lost_frames = self.lost_frames, "ball coasting");

        Some(self.position())
    }

    pub fn velocity(&self) -> Option<Vector3<f32>> {
        self.initialized
            .then(|| self.kf.state().fixed_rows::<3>(3).into_owned())
    }

    pub fn acceleration(&self) -> Option<Vector3<f32>> {
        self.initialized
            .then(|| self.kf.state().fixed_rows::<3>(6).into_owned())
    }

    pub fn state(&self) -> Option<BallState> {
        if !self.initialized {
            return None;
        }

        let x = self.kf.state();

        Some(BallState {
            position: self.position(),
            velocity: x.fixed_rows::<3>(3).into_owned(),
            acceleration: x.fixed_rows::<3>(6).into_owned(),
            lost_frames: self.lost_frames,
        })
    }

    fn position(&self) -> Position3D {
        self.kf.state().fixed_rows::<3>(0).into_owned().into()
    }

    fn clamp_acceleration(&mut self) {
        let limit = self.config.max_acceleration;

        for a in self.kf.x.fixed_rows_mut::<3>(6).iter_mut() {
            *a = a.clamp(-limit, limit);
        }
    }
}

fn filter(config: &BallTrackerConfig) -> KalmanFilter<STATE_DIM, MEASUREMENT_DIM> {
    let noise = &config.noise;

    #[rustfmt::skip]
    let f = SMatrix::<f32, STATE_DIM, STATE_DIM>::from_row_slice(&[
        1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5, 0.0, 0.0, // x' = x + vx + ax / 2
        0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5, 0.0,
        0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5,
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, // vx' = vx + ax
        0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, // ax' = ax
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ]);

    let h = SMatrix::<f32, MEASUREMENT_DIM, STATE_DIM>::identity();
    let p = SMatrix::<f32, STATE_DIM, STATE_DIM>::identity() * noise.initial_var;

    let (qp, qa) = (noise.process_var, noise.process_acceleration_var);
    let q = SMatrix::<f32, STATE_DIM, STATE_DIM>::from_diagonal(
        &SVector::<f32, STATE_DIM>::from_column_slice(&[qp, qp, qp, qp, qp, qp, qa, qa, qa]),
    );

    let r = SMatrix::<f32, MEASUREMENT_DIM, MEASUREMENT_DIM>::identity() * noise.measurement_var;

    KalmanFilter::new(SVector::<f32, STATE_DIM>::zeros(), p, f, h, q, r)
}
