use serde::{Deserialize, Serialize};

use crate::geometry::LineGeometry;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoadSegment {
    pub id: i64,
    pub geometry: LineGeometry,
    pub road_length: f64,
}

/// Fields accepted when creating or replacing a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSegmentParams {
    pub geometry: LineGeometry,
    pub road_length: f64,
}
