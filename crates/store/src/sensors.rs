use duckdb::params;
use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_core::model::sensor::Sensor;
use uuid::Uuid;

use crate::Store;

impl Store {
    pub fn list_sensors(&self) -> Result<Vec<Sensor>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, uuid FROM sensors ORDER BY id ASC")
            .map_err(|e| RoadwatchError::Store(format!("prepare sensors failed: {e}")))?;

        let rows = stmt
            .query_map([], sensor_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query sensors failed: {e}")))?;

        let mut sensors = Vec::new();
        for row in rows {
            sensors
                .push(row.map_err(|e| RoadwatchError::Store(format!("map sensor failed: {e}")))??);
        }
        Ok(sensors)
    }

    pub fn get_sensor_by_uuid(&self, uuid: Uuid) -> Result<Option<Sensor>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, uuid FROM sensors WHERE uuid = ?")
            .map_err(|e| RoadwatchError::Store(format!("prepare sensor lookup failed: {e}")))?;

        let mut rows = stmt
            .query_map(params![uuid.to_string()], sensor_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query sensor failed: {e}")))?;

        match rows.next() {
            Some(row) => {
                let sensor =
                    row.map_err(|e| RoadwatchError::Store(format!("map sensor failed: {e}")))??;
                Ok(Some(sensor))
            }
            None => Ok(None),
        }
    }

    /// Registers a sensor; a uuid already present is left untouched and the
    /// stored row is returned.
    pub fn insert_sensor(&self, name: &str, uuid: Uuid) -> Result<Sensor> {
        if let Some(existing) = self.get_sensor_by_uuid(uuid)? {
            return Ok(existing);
        }

        let conn = self.conn();
        let id = conn
            .query_row(
                "INSERT INTO sensors (id, name, uuid)
                 VALUES (nextval('sensor_id_seq'), ?, ?)
                 RETURNING id",
                params![name, uuid.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| RoadwatchError::Store(format!("insert sensor failed: {e}")))?;

        Ok(Sensor {
            id,
            name: name.to_string(),
            uuid,
        })
    }
}

fn sensor_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Result<Sensor>> {
    let id = row.get::<_, i64>(0)?;
    let name = row.get::<_, String>(1)?;
    let raw_uuid = row.get::<_, String>(2)?;
    Ok(Uuid::parse_str(&raw_uuid)
        .map_err(|e| RoadwatchError::Store(format!("bad stored sensor uuid: {e}")))
        .map(|uuid| Sensor { id, name, uuid }))
}
