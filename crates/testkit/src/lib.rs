use roadwatch_core::geometry::LineGeometry;
use serde_json::{Value, json};
use uuid::Uuid;

pub fn main_street() -> LineGeometry {
    LineGeometry::new(vec![[104.1119814, 30.653166], [104.110012, 30.64971387]]).unwrap()
}

pub fn side_street() -> LineGeometry {
    LineGeometry::new(vec![[104.098, 30.641], [104.1025, 30.6455], [104.107, 30.649]]).unwrap()
}

/// GeoJSON Feature body for segment create/update requests.
pub fn segment_feature(geometry: &LineGeometry, road_length: f64) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": geometry.points(),
        },
        "properties": { "road_length": road_length },
    })
}

pub fn traffic_record_input(plate: &str, sensor: Uuid, road_segment: i64) -> Value {
    json!({
        "license_plate": plate,
        "sensor_uuid": sensor.to_string(),
        "road_segment": road_segment,
        "timestamp": "2026-03-01T12:00:00Z",
    })
}

/// Historical export rows: the second row is the first reversed and must
/// land on the same segment.
pub fn sample_road_csv() -> &'static str {
    "\
Long_start,Lat_start,Long_end,Lat_end,Length,Speed
104.1119814,30.653166,104.110012,30.64971387,1179.21,42.0
104.110012,30.64971387,104.1119814,30.653166,1179.21,18.5
104.20,30.70,104.21,30.71,800.0,55.0
"
}

pub fn sample_sensor_csv(uuid: Uuid) -> String {
    format!("name,uuid\ngantry-north,{uuid}\ngantry-broken,not-a-uuid\n")
}
