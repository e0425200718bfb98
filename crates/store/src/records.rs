use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDateTime;
use duckdb::params;
use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_core::model::car::{self, Car};
use roadwatch_core::model::record::{
    IngestOutcome, RejectedRecord, TrafficRecord, TrafficRecordInput,
};
use roadwatch_core::model::sensor::Sensor;
use uuid::Uuid;

use crate::Store;

/// A record that passed per-field resolution and is ready to insert.
struct ResolvedRecord {
    sensor_id: i64,
    car_id: i64,
    road_segment_id: i64,
    timestamp: chrono::DateTime<chrono::Utc>,
}

impl Store {
    /// Bulk-validates and inserts sensor observations. Cars are created up
    /// front for every well-formed plate in the batch, even when the record
    /// naming them is later rejected; sensors and road segments are then
    /// resolved per record, and inputs that fail resolution are reported
    /// individually without blocking the rest of the batch. All resolvable
    /// records are inserted in one transaction.
    pub fn ingest_records(&self, batch: &[TrafficRecordInput]) -> Result<IngestOutcome> {
        let cars = self.resolve_cars(batch)?;
        let sensors = self.resolve_sensors(batch)?;
        let segments = self.existing_segment_ids(batch)?;

        let mut resolved = Vec::new();
        let mut rejected = Vec::new();

        for input in batch {
            match resolve_input(input, &cars, &sensors, &segments) {
                Ok(record) => resolved.push(record),
                Err(reason) => rejected.push(RejectedRecord::from_input(input, reason)),
            }
        }

        let created = self.insert_resolved(&resolved)?;
        Ok(IngestOutcome { created, rejected })
    }

    /// Lists records newest-first, optionally filtered by license plate.
    pub fn list_records(&self, license_plate: Option<&str>) -> Result<Vec<TrafficRecord>> {
        let conn = self.conn();
        let sql = if license_plate.is_some() {
            "SELECT r.id, r.sensor_id, r.car_id, r.road_segment_id, r.timestamp
             FROM traffic_records r
             JOIN cars c ON c.id = r.car_id
             WHERE c.license_plate = ?
             ORDER BY r.timestamp DESC, r.id DESC"
        } else {
            "SELECT id, sensor_id, car_id, road_segment_id, timestamp
             FROM traffic_records
             ORDER BY timestamp DESC, id DESC"
        };

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| RoadwatchError::Store(format!("prepare records failed: {e}")))?;

        let rows = if let Some(plate) = license_plate {
            stmt.query_map(params![plate], record_from_row)
        } else {
            stmt.query_map([], record_from_row)
        }
        .map_err(|e| RoadwatchError::Store(format!("query records failed: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            records
                .push(row.map_err(|e| RoadwatchError::Store(format!("map record failed: {e}")))?);
        }
        Ok(records)
    }

    pub fn get_record(&self, id: i64) -> Result<TrafficRecord> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, sensor_id, car_id, road_segment_id, timestamp
                 FROM traffic_records WHERE id = ?",
            )
            .map_err(|e| RoadwatchError::Store(format!("prepare record get failed: {e}")))?;

        let mut rows = stmt
            .query_map(params![id], record_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query record failed: {e}")))?;

        match rows.next() {
            Some(row) => row.map_err(|e| RoadwatchError::Store(format!("map record failed: {e}"))),
            None => Err(RoadwatchError::NotFound(format!("traffic record {id}"))),
        }
    }

    pub fn delete_record(&self, id: i64) -> Result<()> {
        self.get_record(id)?;
        let conn = self.conn();
        conn.execute("DELETE FROM traffic_records WHERE id = ?", params![id])
            .map_err(|e| RoadwatchError::Store(format!("delete record failed: {e}")))?;
        Ok(())
    }

    fn resolve_cars(&self, batch: &[TrafficRecordInput]) -> Result<HashMap<String, Car>> {
        let plates: BTreeSet<String> = batch
            .iter()
            .filter_map(|input| input.license_plate.as_deref())
            .filter_map(|raw| car::normalize_license_plate(raw).ok())
            .collect();
        self.get_or_create_cars(&plates)
    }

    fn resolve_sensors(&self, batch: &[TrafficRecordInput]) -> Result<HashMap<String, Sensor>> {
        let mut sensors = HashMap::new();
        for input in batch {
            let Some(raw) = input.sensor_uuid.as_deref() else {
                continue;
            };
            if sensors.contains_key(raw) {
                continue;
            }
            // A malformed uuid fails that record only, so it simply stays
            // out of the map here.
            let Ok(uuid) = Uuid::parse_str(raw) else {
                continue;
            };
            if let Some(sensor) = self.get_sensor_by_uuid(uuid)? {
                sensors.insert(raw.to_string(), sensor);
            }
        }
        Ok(sensors)
    }

    fn existing_segment_ids(&self, batch: &[TrafficRecordInput]) -> Result<HashSet<i64>> {
        let mut segments = HashSet::new();
        for input in batch {
            let Some(id) = input.road_segment else {
                continue;
            };
            if segments.contains(&id) {
                continue;
            }
            if self.get_segment(id).is_ok() {
                segments.insert(id);
            }
        }
        Ok(segments)
    }

    fn insert_resolved(&self, resolved: &[ResolvedRecord]) -> Result<Vec<TrafficRecord>> {
        if resolved.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| RoadwatchError::Store(format!("begin tx failed: {e}")))?;

        let mut created = Vec::with_capacity(resolved.len());
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO traffic_records (id, sensor_id, car_id, road_segment_id, timestamp)
                     VALUES (nextval('traffic_record_id_seq'), ?, ?, ?, ?)
                     RETURNING id",
                )
                .map_err(|e| RoadwatchError::Store(format!("prepare insert records failed: {e}")))?;

            for record in resolved {
                let id = stmt
                    .query_row(
                        params![
                            record.sensor_id,
                            record.car_id,
                            record.road_segment_id,
                            record.timestamp.to_rfc3339(),
                        ],
                        |row| row.get::<_, i64>(0),
                    )
                    .map_err(|e| RoadwatchError::Store(format!("insert record failed: {e}")))?;
                created.push(TrafficRecord {
                    id,
                    sensor: record.sensor_id,
                    car: record.car_id,
                    road_segment: record.road_segment_id,
                    timestamp: record.timestamp,
                });
            }
        }

        tx.commit()
            .map_err(|e| RoadwatchError::Store(format!("commit records failed: {e}")))?;
        Ok(created)
    }
}

fn resolve_input(
    input: &TrafficRecordInput,
    cars: &HashMap<String, Car>,
    sensors: &HashMap<String, Sensor>,
    segments: &HashSet<i64>,
) -> std::result::Result<ResolvedRecord, String> {
    let plate = input
        .license_plate
        .as_deref()
        .ok_or_else(|| "missing license_plate".to_string())?;
    let plate = car::normalize_license_plate(plate)
        .map_err(|_| format!("invalid license_plate: {plate}"))?;
    let car = cars
        .get(&plate)
        .ok_or_else(|| format!("unresolved license_plate: {plate}"))?;

    let raw_uuid = input
        .sensor_uuid
        .as_deref()
        .ok_or_else(|| "missing sensor_uuid".to_string())?;
    let sensor = sensors
        .get(raw_uuid)
        .ok_or_else(|| format!("unknown or malformed sensor_uuid: {raw_uuid}"))?;

    let segment_id = input
        .road_segment
        .ok_or_else(|| "missing road_segment".to_string())?;
    if !segments.contains(&segment_id) {
        return Err(format!("unknown road_segment: {segment_id}"));
    }

    let timestamp = input
        .timestamp
        .ok_or_else(|| "missing timestamp".to_string())?;

    Ok(ResolvedRecord {
        sensor_id: sensor.id,
        car_id: car.id,
        road_segment_id: segment_id,
        timestamp,
    })
}

fn record_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<TrafficRecord> {
    Ok(TrafficRecord {
        id: row.get::<_, i64>(0)?,
        sensor: row.get::<_, i64>(1)?,
        car: row.get::<_, i64>(2)?,
        road_segment: row.get::<_, i64>(3)?,
        timestamp: row.get::<_, NaiveDateTime>(4)?.and_utc(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use roadwatch_core::geometry::LineGeometry;
    use roadwatch_core::model::record::TrafficRecordInput;
    use roadwatch_core::model::segment::RoadSegmentParams;
    use uuid::Uuid;

    use crate::Store;

    fn seeded_store() -> (Store, i64, Uuid) {
        let store = Store::open_in_memory().unwrap();
        let segment = store
            .create_segment(&RoadSegmentParams {
                geometry: LineGeometry::new(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap(),
                road_length: 100.0,
            })
            .unwrap();
        let uuid = Uuid::new_v4();
        store.insert_sensor("gantry-1", uuid).unwrap();
        (store, segment.id, uuid)
    }

    fn input(plate: &str, uuid: &str, segment: Option<i64>) -> TrafficRecordInput {
        TrafficRecordInput {
            license_plate: Some(plate.to_string()),
            sensor_uuid: Some(uuid.to_string()),
            road_segment: segment,
            timestamp: Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn valid_batch_inserts_everything() {
        let (store, segment, uuid) = seeded_store();
        let uuid = uuid.to_string();
        let batch = vec![
            input("AA00AA", &uuid, Some(segment)),
            input("BB11BB", &uuid, Some(segment)),
        ];

        let outcome = store.ingest_records(&batch).unwrap();
        assert_eq!(outcome.created.len(), 2);
        assert!(outcome.rejected.is_empty());
        assert_eq!(store.list_records(None).unwrap().len(), 2);
        // Cars are created on the fly.
        assert_eq!(store.list_cars().unwrap().len(), 2);
    }

    #[test]
    fn partial_batch_inserts_valid_and_reports_invalid() {
        let (store, segment, uuid) = seeded_store();
        let uuid = uuid.to_string();
        let batch = vec![
            input("AA00AA", &uuid, Some(segment)),
            // missing road segment
            input("AA00AA", &uuid, None),
            // malformed sensor uuid
            input("CC00CC", "some-uuid", Some(segment)),
            // missing license plate
            TrafficRecordInput {
                license_plate: None,
                sensor_uuid: Some(uuid.clone()),
                road_segment: Some(segment),
                timestamp: Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()),
            },
        ];

        let outcome = store.ingest_records(&batch).unwrap();
        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.rejected.len(), 3);
        assert_eq!(store.list_records(None).unwrap().len(), 1);
        // Every well-formed plate gets a car, rejected records included.
        assert_eq!(store.list_cars().unwrap().len(), 2);
        // Rejections echo the caller's input.
        assert_eq!(outcome.rejected[1].input["license_plate"], "CC00CC");
        assert_eq!(outcome.rejected[1].input["sensor_uuid"], "some-uuid");
    }

    #[test]
    fn rejected_records_still_create_their_cars() {
        let (store, segment, _) = seeded_store();
        let stranger = Uuid::new_v4().to_string();
        let outcome = store
            .ingest_records(&[input("EE44EE", &stranger, Some(segment))])
            .unwrap();
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.rejected.len(), 1);

        let cars = store.list_cars().unwrap();
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].license_plate, "EE44EE");
    }

    #[test]
    fn all_invalid_batch_creates_no_records() {
        let (store, _, _) = seeded_store();
        let batch = vec![
            TrafficRecordInput {
                license_plate: Some("AA00AA".to_string()),
                ..TrafficRecordInput::default()
            },
            TrafficRecordInput {
                sensor_uuid: Some("some-uuid".to_string()),
                ..TrafficRecordInput::default()
            },
            TrafficRecordInput {
                road_segment: Some(1),
                ..TrafficRecordInput::default()
            },
        ];

        let outcome = store.ingest_records(&batch).unwrap();
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.rejected.len(), 3);
        assert_eq!(store.list_records(None).unwrap().len(), 0);
    }

    #[test]
    fn unknown_sensor_uuid_rejects_record() {
        let (store, segment, _) = seeded_store();
        let stranger = Uuid::new_v4().to_string();
        let outcome = store
            .ingest_records(&[input("AA00AA", &stranger, Some(segment))])
            .unwrap();
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        assert!(outcome.rejected[0].reason.contains("sensor_uuid"));
    }

    #[test]
    fn missing_timestamp_rejects_record() {
        let (store, segment, uuid) = seeded_store();
        let mut record = input("AA00AA", &uuid.to_string(), Some(segment));
        record.timestamp = None;
        let outcome = store.ingest_records(&[record]).unwrap();
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.rejected[0].reason, "missing timestamp");
    }

    #[test]
    fn list_filters_by_license_plate() {
        let (store, segment, uuid) = seeded_store();
        let uuid = uuid.to_string();
        store
            .ingest_records(&[
                input("AA00AA", &uuid, Some(segment)),
                input("BB11BB", &uuid, Some(segment)),
            ])
            .unwrap();

        let filtered = store.list_records(Some("AA00AA")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(store.list_records(Some("ZZ99ZZ")).unwrap().len(), 0);
    }
}
