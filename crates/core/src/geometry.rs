use serde::{Deserialize, Serialize};

use crate::error::{Result, RoadwatchError};

/// An ordered sequence of lon/lat pairs describing a stretch of road.
///
/// Equality is exact coordinate match. Duplicate detection treats a line and
/// its exact reversal as the same segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineGeometry(Vec<[f64; 2]>);

impl LineGeometry {
    pub fn new(points: Vec<[f64; 2]>) -> Result<Self> {
        if points.len() < 2 {
            return Err(RoadwatchError::Validation(
                "a line geometry requires at least two coordinate pairs".to_string(),
            ));
        }
        for [lon, lat] in &points {
            if !lon.is_finite() || !lat.is_finite() {
                return Err(RoadwatchError::Validation(
                    "coordinates must be finite numbers".to_string(),
                ));
            }
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.0
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.0.clone();
        points.reverse();
        Self(points)
    }

    /// True when `other` equals this line forward or exactly reversed.
    pub fn matches_either_direction(&self, other: &Self) -> bool {
        self == other || &self.reversed() == other
    }

    /// Compact JSON text used as the storage representation.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(&self.0).expect("coordinate array serializes")
    }

    pub fn from_wire(raw: &str) -> Result<Self> {
        let points: Vec<[f64; 2]> = serde_json::from_str(raw)
            .map_err(|e| RoadwatchError::Parse(format!("bad stored geometry: {e}")))?;
        Self::new(points)
    }
}
