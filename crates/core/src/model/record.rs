use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event tying a car, a sensor, and a road segment to an observation time.
/// Created by bulk ingestion; never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficRecord {
    pub id: i64,
    pub sensor: i64,
    pub car: i64,
    pub road_segment: i64,
    pub timestamp: DateTime<Utc>,
}

/// Raw ingestion payload. Every field is optional at the wire level so a
/// record missing a reference can be rejected individually with a reason
/// instead of failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrafficRecordInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_segment: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A per-record ingestion failure. `input` echoes what the caller sent, even
/// for payloads that never deserialized into a [`TrafficRecordInput`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectedRecord {
    pub input: serde_json::Value,
    pub reason: String,
}

impl RejectedRecord {
    pub fn from_input(input: &TrafficRecordInput, reason: String) -> Self {
        Self {
            input: serde_json::to_value(input).unwrap_or(serde_json::Value::Null),
            reason,
        }
    }
}

/// Result of one ingestion batch. Valid records are always inserted even when
/// others in the same batch are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestOutcome {
    pub created: Vec<TrafficRecord>,
    pub rejected: Vec<RejectedRecord>,
}
