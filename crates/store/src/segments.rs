use duckdb::params;
use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_core::geometry::LineGeometry;
use roadwatch_core::model::segment::{RoadSegment, RoadSegmentParams};

use crate::Store;

const DUPLICATE_GEOMETRY_MESSAGE: &str =
    "A road segment with these coordinates already exists.";

impl Store {
    /// Lists segments, optionally keeping only those whose latest speed
    /// reading falls inside the named classification tier. An unknown tier
    /// name yields an empty list; segments without readings never match.
    pub fn list_segments(&self, classification: Option<&str>) -> Result<Vec<RoadSegment>> {
        let Some(name) = classification else {
            return self.fetch_all_segments();
        };

        let Some(tier) = self.get_classification_by_name(&name.to_ascii_uppercase())? else {
            return Ok(Vec::new());
        };

        let min = tier.min_speed.unwrap_or(0.0);
        let max = tier.max_speed.unwrap_or(f64::INFINITY);

        let with_latest = self.fetch_segments_with_latest_speed()?;
        Ok(with_latest
            .into_iter()
            .filter_map(|(segment, latest_speed)| {
                (latest_speed >= min && latest_speed <= max).then_some(segment)
            })
            .collect())
    }

    pub fn get_segment(&self, id: i64) -> Result<RoadSegment> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, geometry, road_length FROM road_segments WHERE id = ?")
            .map_err(|e| RoadwatchError::Store(format!("prepare segment get failed: {e}")))?;

        let mut rows = stmt
            .query_map(params![id], segment_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query segment failed: {e}")))?;

        match rows.next() {
            Some(row) => {
                row.map_err(|e| RoadwatchError::Store(format!("map segment row failed: {e}")))?
            }
            None => Err(RoadwatchError::NotFound(format!("road segment {id}"))),
        }
    }

    pub fn create_segment(&self, params: &RoadSegmentParams) -> Result<RoadSegment> {
        if self.duplicate_exists(&params.geometry, None)? {
            return Err(RoadwatchError::Validation(
                DUPLICATE_GEOMETRY_MESSAGE.to_string(),
            ));
        }

        let conn = self.conn();
        let id = conn
            .query_row(
                "INSERT INTO road_segments (id, geometry, road_length)
                 VALUES (nextval('road_segment_id_seq'), ?, ?)
                 RETURNING id",
                params![params.geometry.to_wire(), params.road_length],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| RoadwatchError::Store(format!("insert segment failed: {e}")))?;

        Ok(RoadSegment {
            id,
            geometry: params.geometry.clone(),
            road_length: params.road_length,
        })
    }

    pub fn update_segment(&self, id: i64, params: &RoadSegmentParams) -> Result<RoadSegment> {
        // Resolve existence first so an unknown id is a 404, not a dedup error.
        self.get_segment(id)?;

        if self.duplicate_exists(&params.geometry, Some(id))? {
            return Err(RoadwatchError::Validation(
                DUPLICATE_GEOMETRY_MESSAGE.to_string(),
            ));
        }

        let conn = self.conn();
        conn.execute(
            "UPDATE road_segments SET geometry = ?, road_length = ? WHERE id = ?",
            params![params.geometry.to_wire(), params.road_length, id],
        )
        .map_err(|e| RoadwatchError::Store(format!("update segment failed: {e}")))?;

        Ok(RoadSegment {
            id,
            geometry: params.geometry.clone(),
            road_length: params.road_length,
        })
    }

    /// Deletes a segment together with its readings and traffic records.
    pub fn delete_segment(&self, id: i64) -> Result<()> {
        self.get_segment(id)?;

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| RoadwatchError::Store(format!("begin tx failed: {e}")))?;

        tx.execute(
            "DELETE FROM speed_readings WHERE road_segment_id = ?",
            params![id],
        )
        .map_err(|e| RoadwatchError::Store(format!("delete segment readings failed: {e}")))?;
        tx.execute(
            "DELETE FROM traffic_records WHERE road_segment_id = ?",
            params![id],
        )
        .map_err(|e| RoadwatchError::Store(format!("delete segment records failed: {e}")))?;
        tx.execute("DELETE FROM road_segments WHERE id = ?", params![id])
            .map_err(|e| RoadwatchError::Store(format!("delete segment failed: {e}")))?;

        tx.commit()
            .map_err(|e| RoadwatchError::Store(format!("commit segment delete failed: {e}")))
    }

    /// True when any stored segment's geometry equals the candidate in
    /// forward or exactly reversed point order.
    pub fn duplicate_exists(
        &self,
        geometry: &LineGeometry,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let forward = geometry.to_wire();
        let backward = geometry.reversed().to_wire();

        let conn = self.conn();
        let count = match exclude_id {
            Some(id) => conn
                .query_row(
                    "SELECT COUNT(*) FROM road_segments
                     WHERE (geometry = ? OR geometry = ?) AND id != ?",
                    params![forward, backward, id],
                    |row| row.get::<_, i64>(0),
                )
                .map_err(|e| RoadwatchError::Store(format!("dedup query failed: {e}")))?,
            None => conn
                .query_row(
                    "SELECT COUNT(*) FROM road_segments
                     WHERE geometry = ? OR geometry = ?",
                    params![forward, backward],
                    |row| row.get::<_, i64>(0),
                )
                .map_err(|e| RoadwatchError::Store(format!("dedup query failed: {e}")))?,
        };

        Ok(count > 0)
    }

    /// Finds the stored segment matching the geometry in either direction,
    /// creating it when absent. Used by the CSV importer.
    pub fn get_or_create_segment(
        &self,
        geometry: &LineGeometry,
        road_length: f64,
    ) -> Result<RoadSegment> {
        let forward = geometry.to_wire();
        let backward = geometry.reversed().to_wire();

        let existing = {
            let conn = self.conn();
            let mut stmt = conn
                .prepare(
                    "SELECT id, geometry, road_length FROM road_segments
                     WHERE geometry = ? OR geometry = ?",
                )
                .map_err(|e| RoadwatchError::Store(format!("prepare segment lookup failed: {e}")))?;
            let mut rows = stmt
                .query_map(params![forward, backward], segment_from_row)
                .map_err(|e| RoadwatchError::Store(format!("segment lookup failed: {e}")))?;
            rows.next().transpose().map_err(|e| {
                RoadwatchError::Store(format!("map segment lookup row failed: {e}"))
            })?
        };

        match existing {
            Some(segment) => segment,
            None => self.create_segment(&RoadSegmentParams {
                geometry: geometry.clone(),
                road_length,
            }),
        }
    }

    fn fetch_all_segments(&self) -> Result<Vec<RoadSegment>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, geometry, road_length FROM road_segments ORDER BY id ASC")
            .map_err(|e| RoadwatchError::Store(format!("prepare segments failed: {e}")))?;

        let rows = stmt
            .query_map([], segment_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query segments failed: {e}")))?;

        let mut segments = Vec::new();
        for row in rows {
            segments.push(
                row.map_err(|e| RoadwatchError::Store(format!("map segment row failed: {e}")))??,
            );
        }
        Ok(segments)
    }

    /// Materializes every segment that has at least one reading, paired with
    /// the speed of its newest reading (ties broken by highest reading id).
    fn fetch_segments_with_latest_speed(&self) -> Result<Vec<(RoadSegment, f64)>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, geometry, road_length, speed FROM (
                   SELECT s.id, s.geometry, s.road_length, r.speed,
                          row_number() OVER (
                            PARTITION BY s.id
                            ORDER BY r.created_at DESC, r.id DESC
                          ) AS rn
                   FROM road_segments s
                   JOIN speed_readings r ON r.road_segment_id = s.id
                 ) WHERE rn = 1
                 ORDER BY id ASC",
            )
            .map_err(|e| RoadwatchError::Store(format!("prepare latest speeds failed: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                let id = row.get::<_, i64>(0)?;
                let geometry = row.get::<_, String>(1)?;
                let road_length = row.get::<_, f64>(2)?;
                let speed = row.get::<_, f64>(3)?;
                Ok((id, geometry, road_length, speed))
            })
            .map_err(|e| RoadwatchError::Store(format!("query latest speeds failed: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, geometry, road_length, speed) = row
                .map_err(|e| RoadwatchError::Store(format!("map latest speed row failed: {e}")))?;
            out.push((
                RoadSegment {
                    id,
                    geometry: LineGeometry::from_wire(&geometry)?,
                    road_length,
                },
                speed,
            ));
        }
        Ok(out)
    }
}

fn segment_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Result<RoadSegment>> {
    let id = row.get::<_, i64>(0)?;
    let geometry = row.get::<_, String>(1)?;
    let road_length = row.get::<_, f64>(2)?;
    Ok(LineGeometry::from_wire(&geometry).map(|geometry| RoadSegment {
        id,
        geometry,
        road_length,
    }))
}

#[cfg(test)]
mod tests {
    use roadwatch_core::geometry::LineGeometry;
    use roadwatch_core::model::segment::RoadSegmentParams;

    use crate::Store;

    fn line() -> LineGeometry {
        LineGeometry::new(vec![[104.1119814, 30.653166], [104.110012, 30.64971387]]).unwrap()
    }

    fn params(geometry: LineGeometry) -> RoadSegmentParams {
        RoadSegmentParams {
            geometry,
            road_length: 1179.21,
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let created = store.create_segment(&params(line())).unwrap();
        let fetched = store.get_segment(created.id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn duplicate_detection_agrees_for_both_directions() {
        let store = Store::open_in_memory().unwrap();
        store.create_segment(&params(line())).unwrap();

        assert!(store.duplicate_exists(&line(), None).unwrap());
        assert!(store.duplicate_exists(&line().reversed(), None).unwrap());

        let other = LineGeometry::new(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap();
        assert!(!store.duplicate_exists(&other, None).unwrap());
    }

    #[test]
    fn reversed_create_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let geometry = LineGeometry::new(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap();
        store.create_segment(&params(geometry.clone())).unwrap();

        let err = store
            .create_segment(&params(geometry.reversed()))
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(store.list_segments(None).unwrap().len(), 1);
    }

    #[test]
    fn update_excludes_own_geometry_from_dedup() {
        let store = Store::open_in_memory().unwrap();
        let created = store.create_segment(&params(line())).unwrap();

        assert!(
            !store
                .duplicate_exists(&line(), Some(created.id))
                .unwrap()
        );

        // Re-saving the same geometry on the same row is allowed.
        let updated = store.update_segment(created.id, &params(line())).unwrap();
        assert_eq!(updated.id, created.id);
    }

    #[test]
    fn update_to_another_segments_geometry_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        store.create_segment(&params(line())).unwrap();
        let other = store
            .create_segment(&params(
                LineGeometry::new(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap(),
            ))
            .unwrap();

        assert!(store.update_segment(other.id, &params(line())).is_err());
    }

    #[test]
    fn get_or_create_reuses_reversed_segment() {
        let store = Store::open_in_memory().unwrap();
        let first = store.get_or_create_segment(&line(), 100.0).unwrap();
        let second = store
            .get_or_create_segment(&line().reversed(), 100.0)
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_segments(None).unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_segment() {
        let store = Store::open_in_memory().unwrap();
        let created = store.create_segment(&params(line())).unwrap();
        store.delete_segment(created.id).unwrap();
        assert!(store.get_segment(created.id).is_err());
        assert!(store.delete_segment(created.id).is_err());
    }
}
