use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped observed speed for a road segment. Append-only; `created_at`
/// is assigned at insert and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeedReading {
    pub id: i64,
    pub road_segment: i64,
    pub speed: f64,
    pub created_at: DateTime<Utc>,
}

/// A reading staged for bulk insertion (CSV import buffers these in chunks).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSpeedReading {
    pub road_segment: i64,
    pub speed: f64,
    pub created_at: DateTime<Utc>,
}
