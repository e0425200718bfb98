//! GeoJSON wire shapes for road segments and the ingestion response body.

use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_core::geometry::LineGeometry;
use roadwatch_core::model::record::{RejectedRecord, TrafficRecord};
use roadwatch_core::model::segment::{RoadSegment, RoadSegmentParams};
use serde::{Deserialize, Serialize};

/// A road segment as a GeoJSON `Feature` with a `LineString` geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: LineStringGeometry,
    pub properties: SegmentProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineStringGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentProperties {
    pub road_length: f64,
}

/// Partial update body: absent parts keep their stored values.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentPatch {
    #[serde(default)]
    pub geometry: Option<LineStringGeometry>,
    #[serde(default)]
    pub properties: Option<SegmentPatchProperties>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentPatchProperties {
    #[serde(default)]
    pub road_length: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RecordIngestResponse {
    pub data: Vec<TrafficRecord>,
    pub invalid_inputs: Vec<RejectedRecord>,
}

impl SegmentFeature {
    pub fn from_model(segment: &RoadSegment) -> Self {
        Self {
            id: Some(segment.id),
            kind: "Feature".to_string(),
            geometry: LineStringGeometry {
                kind: "LineString".to_string(),
                coordinates: segment.geometry.points().to_vec(),
            },
            properties: SegmentProperties {
                road_length: segment.road_length,
            },
        }
    }

    /// Validates the feature and converts it to create/update parameters.
    /// Any client-sent `id` is ignored.
    pub fn into_params(self) -> Result<RoadSegmentParams> {
        Ok(RoadSegmentParams {
            geometry: self.geometry.into_line()?,
            road_length: self.properties.road_length,
        })
    }
}

impl LineStringGeometry {
    pub fn into_line(self) -> Result<LineGeometry> {
        if self.kind != "LineString" {
            return Err(RoadwatchError::Validation(format!(
                "unsupported geometry type: {}",
                self.kind
            )));
        }
        LineGeometry::new(self.coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_round_trips_through_params() {
        let segment = RoadSegment {
            id: 3,
            geometry: LineGeometry::new(vec![[104.11, 30.65], [104.10, 30.64]]).unwrap(),
            road_length: 1179.21,
        };
        let feature = SegmentFeature::from_model(&segment);
        assert_eq!(feature.kind, "Feature");
        assert_eq!(feature.geometry.kind, "LineString");

        let params = feature.into_params().unwrap();
        assert_eq!(params.geometry, segment.geometry);
        assert_eq!(params.road_length, segment.road_length);
    }

    #[test]
    fn rejects_non_linestring_geometry() {
        let feature = SegmentFeature {
            id: None,
            kind: "Feature".to_string(),
            geometry: LineStringGeometry {
                kind: "Point".to_string(),
                coordinates: vec![[0.0, 0.0], [1.0, 1.0]],
            },
            properties: SegmentProperties { road_length: 10.0 },
        };
        assert!(feature.into_params().is_err());
    }

    #[test]
    fn serialized_feature_has_geojson_shape() {
        let segment = RoadSegment {
            id: 1,
            geometry: LineGeometry::new(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap(),
            road_length: 5.5,
        };
        let value = serde_json::to_value(SegmentFeature::from_model(&segment)).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["geometry"]["type"], "LineString");
        assert_eq!(value["geometry"]["coordinates"][1][0], 1.0);
        assert_eq!(value["properties"]["road_length"], 5.5);
    }
}
