use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::params;
use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_core::model::classification::TrafficClassification;
use roadwatch_core::model::reading::{NewSpeedReading, SpeedReading};

use crate::Store;

impl Store {
    /// Lists readings newest-first, optionally for a single segment.
    pub fn list_readings(&self, road_segment: Option<i64>) -> Result<Vec<SpeedReading>> {
        let conn = self.conn();
        let sql = if road_segment.is_some() {
            "SELECT id, road_segment_id, speed, created_at FROM speed_readings
             WHERE road_segment_id = ?
             ORDER BY created_at DESC, id DESC"
        } else {
            "SELECT id, road_segment_id, speed, created_at FROM speed_readings
             ORDER BY created_at DESC, id DESC"
        };

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| RoadwatchError::Store(format!("prepare readings failed: {e}")))?;

        let mut readings = Vec::new();
        let rows = if let Some(segment) = road_segment {
            stmt.query_map(params![segment], reading_from_row)
        } else {
            stmt.query_map([], reading_from_row)
        }
        .map_err(|e| RoadwatchError::Store(format!("query readings failed: {e}")))?;

        for row in rows {
            readings
                .push(row.map_err(|e| RoadwatchError::Store(format!("map reading failed: {e}")))?);
        }
        Ok(readings)
    }

    pub fn get_reading(&self, id: i64) -> Result<SpeedReading> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, road_segment_id, speed, created_at FROM speed_readings WHERE id = ?")
            .map_err(|e| RoadwatchError::Store(format!("prepare reading get failed: {e}")))?;

        let mut rows = stmt
            .query_map(params![id], reading_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query reading failed: {e}")))?;

        match rows.next() {
            Some(row) => {
                row.map_err(|e| RoadwatchError::Store(format!("map reading failed: {e}")))
            }
            None => Err(RoadwatchError::NotFound(format!("speed reading {id}"))),
        }
    }

    /// Creates a reading stamped with the current time.
    pub fn create_reading(&self, road_segment: i64, speed: f64) -> Result<SpeedReading> {
        self.create_reading_at(road_segment, speed, Utc::now())
    }

    /// Creates a reading with an explicit timestamp. Exposed for imports and
    /// backfill; API creation always uses the insert time.
    pub fn create_reading_at(
        &self,
        road_segment: i64,
        speed: f64,
        created_at: DateTime<Utc>,
    ) -> Result<SpeedReading> {
        self.require_segment(road_segment)?;

        let conn = self.conn();
        let id = conn
            .query_row(
                "INSERT INTO speed_readings (id, road_segment_id, speed, created_at)
                 VALUES (nextval('speed_reading_id_seq'), ?, ?, ?)
                 RETURNING id",
                params![road_segment, speed, created_at.to_rfc3339()],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| RoadwatchError::Store(format!("insert reading failed: {e}")))?;

        Ok(SpeedReading {
            id,
            road_segment,
            speed,
            created_at,
        })
    }

    /// Bulk-inserts pre-staged readings in one transaction. Referenced
    /// segments are assumed valid (the importer creates them first).
    pub fn insert_readings(&self, readings: &[NewSpeedReading]) -> Result<()> {
        if readings.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| RoadwatchError::Store(format!("begin tx failed: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO speed_readings (id, road_segment_id, speed, created_at)
                     VALUES (nextval('speed_reading_id_seq'), ?, ?, ?)",
                )
                .map_err(|e| RoadwatchError::Store(format!("prepare insert readings failed: {e}")))?;

            for reading in readings {
                stmt.execute(params![
                    reading.road_segment,
                    reading.speed,
                    reading.created_at.to_rfc3339(),
                ])
                .map_err(|e| RoadwatchError::Store(format!("insert reading failed: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| RoadwatchError::Store(format!("commit readings failed: {e}")))
    }

    /// Updates speed and owning segment. `created_at` is immutable.
    pub fn update_reading(&self, id: i64, road_segment: i64, speed: f64) -> Result<SpeedReading> {
        let existing = self.get_reading(id)?;
        self.require_segment(road_segment)?;

        let conn = self.conn();
        conn.execute(
            "UPDATE speed_readings SET road_segment_id = ?, speed = ? WHERE id = ?",
            params![road_segment, speed, id],
        )
        .map_err(|e| RoadwatchError::Store(format!("update reading failed: {e}")))?;

        Ok(SpeedReading {
            id,
            road_segment,
            speed,
            created_at: existing.created_at,
        })
    }

    pub fn delete_reading(&self, id: i64) -> Result<()> {
        self.get_reading(id)?;
        let conn = self.conn();
        conn.execute("DELETE FROM speed_readings WHERE id = ?", params![id])
            .map_err(|e| RoadwatchError::Store(format!("delete reading failed: {e}")))?;
        Ok(())
    }

    /// The newest reading for a segment, by creation time then id.
    pub fn latest_reading(&self, road_segment: i64) -> Result<Option<SpeedReading>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, road_segment_id, speed, created_at FROM speed_readings
                 WHERE road_segment_id = ?
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
            )
            .map_err(|e| RoadwatchError::Store(format!("prepare latest reading failed: {e}")))?;

        let mut rows = stmt
            .query_map(params![road_segment], reading_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query latest reading failed: {e}")))?;

        rows.next()
            .transpose()
            .map_err(|e| RoadwatchError::Store(format!("map latest reading failed: {e}")))
    }

    /// The classification of a segment's newest reading, or None when the
    /// segment has no readings or no tier contains the speed.
    pub fn current_classification(
        &self,
        road_segment: i64,
    ) -> Result<Option<TrafficClassification>> {
        let Some(latest) = self.latest_reading(road_segment)? else {
            return Ok(None);
        };
        self.resolve_classification(latest.speed)
    }

    fn require_segment(&self, road_segment: i64) -> Result<()> {
        match self.get_segment(road_segment) {
            Ok(_) => Ok(()),
            Err(RoadwatchError::NotFound(_)) => Err(RoadwatchError::Validation(format!(
                "unknown road segment: {road_segment}"
            ))),
            Err(e) => Err(e),
        }
    }
}

fn reading_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<SpeedReading> {
    Ok(SpeedReading {
        id: row.get::<_, i64>(0)?,
        road_segment: row.get::<_, i64>(1)?,
        speed: row.get::<_, f64>(2)?,
        created_at: row.get::<_, NaiveDateTime>(3)?.and_utc(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use roadwatch_core::geometry::LineGeometry;
    use roadwatch_core::model::reading::NewSpeedReading;
    use roadwatch_core::model::segment::RoadSegmentParams;

    use crate::Store;

    fn store_with_segment() -> (Store, i64) {
        let store = Store::open_in_memory().unwrap();
        let segment = store
            .create_segment(&RoadSegmentParams {
                geometry: LineGeometry::new(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap(),
                road_length: 100.0,
            })
            .unwrap();
        (store, segment.id)
    }

    #[test]
    fn readings_list_newest_first() {
        let (store, segment) = store_with_segment();
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        store.create_reading_at(segment, 25.0, base).unwrap();
        store
            .create_reading_at(segment, 45.0, base + Duration::days(1))
            .unwrap();

        let readings = store.list_readings(Some(segment)).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].speed, 45.0);
        assert_eq!(readings[1].speed, 25.0);
    }

    #[test]
    fn create_rejects_unknown_segment() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.create_reading(4242, 50.0).is_err());
    }

    #[test]
    fn current_classification_tracks_latest_reading() {
        let (store, segment) = store_with_segment();
        assert!(store.current_classification(segment).unwrap().is_none());

        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        store.create_reading_at(segment, 25.0, base).unwrap();
        store
            .create_reading_at(segment, 75.0, base + Duration::days(1))
            .unwrap();

        let tier = store.current_classification(segment).unwrap().unwrap();
        assert_eq!(tier.name, "HIGH");

        store
            .create_reading_at(segment, 11.0, base + Duration::days(2))
            .unwrap();
        let tier = store.current_classification(segment).unwrap().unwrap();
        assert_eq!(tier.name, "LOW");
    }

    #[test]
    fn unmatched_speed_yields_no_classification() {
        let (store, segment) = store_with_segment();
        store.create_reading(segment, -10.0).unwrap();
        assert!(store.current_classification(segment).unwrap().is_none());
    }

    #[test]
    fn bulk_insert_writes_all_rows() {
        let (store, segment) = store_with_segment();
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let staged = (0..5)
            .map(|i| NewSpeedReading {
                road_segment: segment,
                speed: 10.0 + i as f64,
                created_at: base + Duration::seconds(i),
            })
            .collect::<Vec<_>>();
        store.insert_readings(&staged).unwrap();
        assert_eq!(store.list_readings(Some(segment)).unwrap().len(), 5);
    }

    #[test]
    fn update_keeps_created_at() {
        let (store, segment) = store_with_segment();
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let created = store.create_reading_at(segment, 30.0, base).unwrap();

        let updated = store.update_reading(created.id, segment, 60.0).unwrap();
        assert_eq!(updated.speed, 60.0);
        assert_eq!(updated.created_at, base);

        let fetched = store.get_reading(created.id).unwrap();
        assert_eq!(fetched.speed, 60.0);
        assert_eq!(fetched.created_at, base);
    }
}
