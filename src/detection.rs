use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// One detector output for one object in one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
    pub bbox: BBox<Ltrb>,
    /// Depth, only reported by 3-D capable detectors
    #[serde(
        rename = "z_position",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub z: Option<f32>,
}

impl Detection {
    pub fn new(class_label: impl Into<String>, confidence: f32, bbox: BBox<Ltrb>) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bbox,
            z: None,
        }
    }

    #[inline]
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    /// Checks the detector contract: finite corners with `x1 < x2`, `y1 < y2`
    /// and a confidence within `[0, 1]`.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.bbox.is_finite() {
            return Err("bbox has non-finite coordinates");
        }

        if self.bbox.width() <= 0.0 || self.bbox.height() <= 0.0 {
            return Err("bbox corners are inverted or the box is empty");
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err("confidence outside of [0, 1]");
        }

        if matches!(self.z, Some(z) if !z.is_finite()) {
            return Err("z position is not finite");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_well_formed() {
        let det = Detection::new("player", 0.9, BBox::ltrb(100.0, 100.0, 150.0, 150.0));
        assert!(det.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_box() {
        let det = Detection::new("player", 0.9, BBox::ltrb(150.0, 100.0, 100.0, 150.0));
        assert!(det.validate().is_err());

        let det = Detection::new("player", 0.9, BBox::ltrb(100.0, 100.0, 150.0, 100.0));
        assert!(det.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let det = Detection::new("player", 1.5, BBox::ltrb(0.0, 0.0, 1.0, 1.0));
        assert!(det.validate().is_err());

        let det = Detection::new("player", f32::NAN, BBox::ltrb(0.0, 0.0, 1.0, 1.0));
        assert!(det.validate().is_err());
    }

    #[test]
    fn test_deserialize_detector_output() {
        let json = r#"{"class":"ball","confidence":0.8,"bbox":[50.0,31.5,55.0,36.5],"z_position":1.2}"#;
        let det: Detection = serde_json::from_str(json).unwrap();

        assert_eq!(det.class_label, "ball");
        assert_eq!(det.bbox.center(), (52.5, 34.0));
        assert_eq!(det.z, Some(1.2));

        let json = r#"{"class":"player","confidence":0.8,"bbox":[0.0,0.0,10.0,10.0]}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.z, None);
    }
}
