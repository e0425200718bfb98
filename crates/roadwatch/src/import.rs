//! CSV importers for historical road data and sensor registrations.
//!
//! Both importers skip and log rows they cannot parse; a bad line never
//! aborts the file.

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_core::geometry::LineGeometry;
use roadwatch_core::model::reading::NewSpeedReading;
use roadwatch_store::Store;
use serde::Deserialize;
use uuid::Uuid;

/// One line of the historical export: a two-point segment with a measured
/// speed.
#[derive(Debug, Deserialize)]
struct RoadRow {
    #[serde(rename = "Long_start")]
    long_start: f64,
    #[serde(rename = "Lat_start")]
    lat_start: f64,
    #[serde(rename = "Long_end")]
    long_end: f64,
    #[serde(rename = "Lat_end")]
    lat_end: f64,
    #[serde(rename = "Length")]
    length: f64,
    #[serde(rename = "Speed")]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct SensorRow {
    name: String,
    uuid: String,
}

#[derive(Debug, Default)]
pub struct RoadImportSummary {
    pub readings: usize,
    pub segments: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct SensorImportSummary {
    pub loaded: usize,
    pub skipped: usize,
}

/// Imports segments and readings from a CSV export. Rows sharing a geometry
/// (forward or reversed) reuse one stored segment; readings are flushed in
/// chunks of `chunk_size`.
pub fn import_road_csv(store: &Store, path: &Path, chunk_size: usize) -> Result<RoadImportSummary> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| RoadwatchError::Io(format!("failed opening {}: {e}", path.display())))?;

    let mut summary = RoadImportSummary::default();
    let mut segment_ids = HashSet::new();
    let mut staged: Vec<NewSpeedReading> = Vec::with_capacity(chunk_size);

    for (index, row) in reader.deserialize::<RoadRow>().enumerate() {
        let line = index + 2; // header is line 1
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping unparseable row");
                summary.skipped += 1;
                continue;
            }
        };

        let geometry = match LineGeometry::new(vec![
            [row.long_start, row.lat_start],
            [row.long_end, row.lat_end],
        ]) {
            Ok(geometry) => geometry,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping row with bad coordinates");
                summary.skipped += 1;
                continue;
            }
        };

        let segment = store.get_or_create_segment(&geometry, row.length)?;
        segment_ids.insert(segment.id);
        staged.push(NewSpeedReading {
            road_segment: segment.id,
            speed: row.speed,
            created_at: Utc::now(),
        });

        if staged.len() >= chunk_size {
            store.insert_readings(&staged)?;
            summary.readings += staged.len();
            staged.clear();
        }
    }

    if !staged.is_empty() {
        store.insert_readings(&staged)?;
        summary.readings += staged.len();
    }

    summary.segments = segment_ids.len();
    Ok(summary)
}

/// Registers sensors from a `name,uuid` CSV. Already-known uuids count as
/// loaded; rows with a malformed uuid are skipped.
pub fn load_sensors_csv(store: &Store, path: &Path) -> Result<SensorImportSummary> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| RoadwatchError::Io(format!("failed opening {}: {e}", path.display())))?;

    let mut summary = SensorImportSummary::default();
    for (index, row) in reader.deserialize::<SensorRow>().enumerate() {
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping unparseable sensor row");
                summary.skipped += 1;
                continue;
            }
        };

        let uuid = match Uuid::parse_str(row.uuid.trim()) {
            Ok(uuid) => uuid,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping sensor row with bad uuid");
                summary.skipped += 1;
                continue;
            }
        };

        store.insert_sensor(row.name.trim(), uuid)?;
        summary.loaded += 1;
    }

    Ok(summary)
}
