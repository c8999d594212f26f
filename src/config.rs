//! Tracker configuration. Every field has a default matching the reference
//! deployment, and every struct deserializes with missing fields filled in.

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

/// Noise levels of the box motion model (all variances, diagonal).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MotionNoise {
    pub initial_position_var: f32,
    pub initial_velocity_var: f32,
    pub process_position_var: f32,
    pub process_velocity_var: f32,
    pub measurement_var: f32,
}

impl Default for MotionNoise {
    fn default() -> Self {
        Self {
            initial_position_var: 10.0,
            initial_velocity_var: 10_000.0,
            process_position_var: 1.0,
            process_velocity_var: 0.01,
            measurement_var: 1.0,
        }
    }
}

impl MotionNoise {
    fn validate(&self) -> Result<(), Error> {
        positive("noise.initial_position_var", self.initial_position_var)?;
        positive("noise.initial_velocity_var", self.initial_velocity_var)?;
        positive("noise.process_position_var", self.process_position_var)?;
        positive("noise.process_velocity_var", self.process_velocity_var)?;
        positive("noise.measurement_var", self.measurement_var)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive missed frames a track survives; deleted once `misses > max_age`
    pub max_age: u32,
    /// Corrections needed before a track is reported
    pub min_hits: u32,
    /// Minimum IoU between a prediction and a detection to accept a match
    pub iou_threshold: f32,
    pub noise: MotionNoise,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 1,
            min_hits: 3,
            iou_threshold: 0.3,
            noise: MotionNoise::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_hits == 0 {
            return Err(Error::InvalidConfig("min_hits must be at least 1".into()));
        }

        unit_interval("iou_threshold", self.iou_threshold)?;
        self.noise.validate()
    }
}

/// Noise levels of the ball motion model (all variances, diagonal).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BallNoise {
    pub initial_var: f32,
    pub process_var: f32,
    pub process_acceleration_var: f32,
    pub measurement_var: f32,
}

impl Default for BallNoise {
    fn default() -> Self {
        Self {
            initial_var: 1000.0,
            process_var: 1.0,
            process_acceleration_var: 0.01,
            measurement_var: 1.0,
        }
    }
}

impl BallNoise {
    fn validate(&self) -> Result<(), Error> {
        positive("noise.initial_var", self.initial_var)?;
        positive("noise.process_var", self.process_var)?;
        positive("noise.process_acceleration_var", self.process_acceleration_var)?;
        positive("noise.measurement_var", self.measurement_var)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BallTrackerConfig {
    /// Frames the ball may go unseen before the track is dropped
    pub max_lost_frames: u32,
    /// Detections below this confidence count as no detection
    pub min_confidence: f32,
    /// Bound on each acceleration component, in units per frame squared
    pub max_acceleration: f32,
    pub noise: BallNoise,
}

impl Default for BallTrackerConfig {
    fn default() -> Self {
        Self {
            max_lost_frames: 10,
            min_confidence: 0.3,
            max_acceleration: 50.0,
            noise: BallNoise::default(),
        }
    }
}

impl BallTrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        unit_interval("min_confidence", self.min_confidence)?;
        positive("max_acceleration", self.max_acceleration)?;
        self.noise.validate()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FieldTrackerConfig {
    /// Class label routed to the ball tracker instead of the object tracker
    pub ball_label: String,
    pub objects: TrackerConfig,
    pub ball: BallTrackerConfig,
}

impl Default for FieldTrackerConfig {
    fn default() -> Self {
        Self {
            ball_label: "ball".to_string(),
            objects: TrackerConfig::default(),
            ball: BallTrackerConfig::default(),
        }
    }
}

impl FieldTrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.ball_label.is_empty() {
            return Err(Error::InvalidConfig("ball_label must not be empty".into()));
        }

        self.objects.validate()?;
        self.ball.validate()
    }
}

fn positive(name: &str, value: f32) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{} must be finite and positive, got {}",
            name, value
        )))
    }
}

fn unit_interval(name: &str, value: f32) -> Result<(), Error> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}
