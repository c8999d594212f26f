//! Constant-velocity box motion model.
//!
//! State is `[cx, cy, w, h, vcx, vcy, vw]`: the box centre, width and height,
//! plus velocities for centre-x, centre-y and width. Height carries no
//! velocity of its own and stays constant between corrections.
//! Observations are `[cx, cy, w, h]` taken straight from a detection box.

use nalgebra::{SMatrix, SVector, Vector4};

use crate::bbox::{BBox, Ltrb};
use crate::config::MotionNoise;
use crate::error::Error;
use crate::kalman::KalmanFilter;

pub const STATE_DIM: usize = 7;
pub const MEASUREMENT_DIM: usize = 4;

#[derive(Debug, Clone)]
pub struct BoxMotionModel {
    kf: KalmanFilter<STATE_DIM, MEASUREMENT_DIM>,
}

impl BoxMotionModel {
    pub fn new(bbox: &BBox<Ltrb>, noise: &MotionNoise) -> Self {
        let z = measurement(bbox);
        let x = SVector::<f32, STATE_DIM>::from_column_slice(&[
            z[0], z[1], z[2], z[3], 0.0, 0.0, 0.0,
        ]);

        let (pp, pv) = (noise.initial_position_var, noise.initial_velocity_var);
        let p = SMatrix::<f32, STATE_DIM, STATE_DIM>::from_diagonal(
            &SVector::<f32, STATE_DIM>::from_column_slice(&[pp, pp, pp, pp, pv, pv, pv]),
        );

        #[rustfmt::skip]
        let f = SMatrix::<f32, STATE_DIM, STATE_DIM>::from_row_slice(&[
            1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, // cx' = cx + vcx
            0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, // cy' = cy + vcy
            0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, // w' = w + vw
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, // h' = h
            0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ]);

        let h = SMatrix::<f32, MEASUREMENT_DIM, STATE_DIM>::identity();

        let (qp, qv) = (noise.process_position_var, noise.process_velocity_var);
        let q = SMatrix::<f32, STATE_DIM, STATE_DIM>::from_diagonal(
            &SVector::<f32, STATE_DIM>::from_column_slice(&[qp, qp, qp, qp, qv, qv, qv]),
        );

        let r = SMatrix::<f32, MEASUREMENT_DIM, MEASUREMENT_DIM>::identity()
            * noise.measurement_var;

        Self {
            kf: KalmanFilter::new(x, p, f, h, q, r),
        }
    }

    /// Advances one frame and returns the predicted box.
    pub fn predict(&mut self) -> BBox<Ltrb> {
        // A shrinking width must not step through zero
        if self.kf.x[2] + self.kf.x[6] <= 0.0 {
            self.kf.x[6] = 0.0;
        }

        self.kf.predict();
        self.bbox()
    }

    pub fn correct(&mut self, bbox: &BBox<Ltrb>) -> Result<(), Error> {
        self.kf.correct(&measurement(bbox))
    }

    /// Box of the current state estimate.
    pub fn bbox(&self) -> BBox<Ltrb> {
        let x = self.kf.state();
        BBox::xywh(x[0], x[1], x[2], x[3]).as_ltrb()
    }

    /// Centre velocity in pixels per frame.
    #[inline]
    pub fn velocity(&self) -> (f32, f32) {
        let x = self.kf.state();
        (x[4], x[5])
    }
}

fn measurement(bbox: &BBox<Ltrb>) -> Vector4<f32> {
    let c = bbox.as_xywh();
    Vector4::new(c.cx(), c.cy(), c.width(), c.height())
}
