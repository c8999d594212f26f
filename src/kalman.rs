//! Linear Kalman filter over statically sized state and measurement spaces.

use nalgebra::{SMatrix, SVector};

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct KalmanFilter<const X: usize, const Z: usize> {
    /// State vector
    pub x: SVector<f32, X>,
    /// State covariance matrix
    pub p: SMatrix<f32, X, X>,
    /// State transition matrix
    pub f: SMatrix<f32, X, X>,
    /// Observation matrix
    pub h: SMatrix<f32, Z, X>,
    /// Process noise covariance
    pub q: SMatrix<f32, X, X>,
    /// Observation noise covariance
    pub r: SMatrix<f32, Z, Z>,
}

impl<const X: usize, const Z: usize> KalmanFilter<X, Z> {
    pub fn new(
        x: SVector<f32, X>,
        p: SMatrix<f32, X, X>,
        f: SMatrix<f32, X, X>,
        h: SMatrix<f32, Z, X>,
        q: SMatrix<f32, X, X>,
        r: SMatrix<f32, Z, Z>,
    ) -> Self {
        Self { x, p, f, h, q, r }
    }

    /// x = F * x, P = F * P * F^T + Q
    pub fn predict(&mut self) {
        self.x = self.f * self.x;
        self.p = self.f * self.p * self.f.transpose() + self.q;
        self.symmetrize();
    }

    /// Corrects the state with observation `z`.
    ///
    /// Fails when the innovation covariance cannot be inverted or the
    /// corrected state is no longer finite; both mean the noise parameters
    /// are unusable and the filter must not be trusted further.
    pub fn correct(&mut self, z: &SVector<f32, Z>) -> Result<(), Error> {
        let ht = self.h.transpose();

        // Residual: y = z - H * x
        let y = z - self.h * self.x;

        // Innovation covariance: S = H * P * H^T + R
        let s = self.h * self.p * ht + self.r;
        let s_inv = s.try_inverse().ok_or(Error::SingularCovariance)?;

        // Kalman gain: K = P * H^T * S^-1
        let k = self.p * ht * s_inv;

        self.x += k * y;
        self.p = (SMatrix::<f32, X, X>::identity() - k * self.h) * self.p;
        self.symmetrize();

        if !self.x.iter().all(|v| v.is_finite()) {
            return Err(Error::NumericalInstability("state is not finite"));
        }

        if !self.p.iter().all(|v| v.is_finite()) {
            return Err(Error::NumericalInstability("covariance is not finite"));
        }

        Ok(())
    }

    #[inline]
    pub fn state(&self) -> &SVector<f32, X> {
        &self.x
    }

    #[inline]
    pub fn covariance(&self) -> &SMatrix<f32, X, X> {
        &self.p
    }

    // Rounding drifts P away from symmetric over long runs.
    fn symmetrize(&mut self) {
        self.p = (self.p + self.p.transpose()) * 0.5;
    }
}
