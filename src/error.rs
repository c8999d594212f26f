use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Invalid Config: {0}")]
    InvalidConfig(String),

    #[error("Invalid Detection #{index}: {reason}")]
    InvalidDetection { index: usize, reason: &'static str },

    #[error("Innovation covariance is singular")]
    SingularCovariance,

    #[error("Filter diverged: {0}")]
    NumericalInstability(&'static str),

    #[error("Assignment Error: {0}")]
    Assignment(String),
}
