use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use duckdb::Connection;
use roadwatch_core::error::{Result, RoadwatchError};
use serde::{Deserialize, Serialize};

use crate::schema::SCHEMA_SQL;

/// Default congestion tiers, applied when the classification table is empty.
const DEFAULT_TIERS: [(&str, Option<f64>, Option<f64>); 3] = [
    ("LOW", Some(0.0), Some(20.0)),
    ("MEDIUM", Some(21.0), Some(50.0)),
    ("HIGH", Some(51.0), None),
];

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub db_path: String,
    pub db_size_bytes: u64,
    pub road_segments_count: usize,
    pub speed_readings_count: usize,
    pub traffic_records_count: usize,
    pub cars_count: usize,
    pub sensors_count: usize,
    pub classifications_count: usize,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RoadwatchError::Io(format!("failed to create db dir: {e}")))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| RoadwatchError::Store(format!("failed to open duckdb: {e}")))?;
        init_connection(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.display().to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RoadwatchError::Store(format!("failed to open in-memory db: {e}")))?;
        init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: ":memory:".to_string(),
        })
    }

    pub(crate) fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }

    pub fn status(&self) -> Result<StoreStatus> {
        let conn = self.conn();

        let road_segments_count = scalar_usize(&conn, "SELECT COUNT(*) FROM road_segments")?;
        let speed_readings_count = scalar_usize(&conn, "SELECT COUNT(*) FROM speed_readings")?;
        let traffic_records_count = scalar_usize(&conn, "SELECT COUNT(*) FROM traffic_records")?;
        let cars_count = scalar_usize(&conn, "SELECT COUNT(*) FROM cars")?;
        let sensors_count = scalar_usize(&conn, "SELECT COUNT(*) FROM sensors")?;
        let classifications_count =
            scalar_usize(&conn, "SELECT COUNT(*) FROM traffic_classifications")?;

        let db_size_bytes = if self.db_path == ":memory:" {
            0
        } else {
            fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStatus {
            db_path: self.db_path.clone(),
            db_size_bytes,
            road_segments_count,
            speed_readings_count,
            traffic_records_count,
            cars_count,
            sensors_count,
            classifications_count,
        })
    }
}

fn init_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA threads=4;")
        .map_err(|e| RoadwatchError::Store(format!("failed to set pragmas: {e}")))?;
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| RoadwatchError::Store(format!("failed to initialize schema: {e}")))?;
    seed_default_classifications(conn)
}

fn seed_default_classifications(conn: &Connection) -> Result<()> {
    let existing = scalar_usize(conn, "SELECT COUNT(*) FROM traffic_classifications")?;
    if existing > 0 {
        return Ok(());
    }

    let mut stmt = conn
        .prepare(
            "INSERT INTO traffic_classifications (id, name, min_speed, max_speed)
             VALUES (nextval('classification_id_seq'), ?, ?, ?)",
        )
        .map_err(|e| RoadwatchError::Store(format!("prepare tier seed failed: {e}")))?;

    for (name, min_speed, max_speed) in DEFAULT_TIERS {
        stmt.execute(duckdb::params![name, min_speed, max_speed])
            .map_err(|e| RoadwatchError::Store(format!("seed tier {name} failed: {e}")))?;
    }

    Ok(())
}

pub(crate) fn scalar_usize(conn: &Connection, sql: &str) -> Result<usize> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|v| v as usize)
        .map_err(|e| RoadwatchError::Store(format!("query failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_initializes_with_default_tiers() {
        let store = Store::open_in_memory().unwrap();
        let status = store.status().unwrap();
        assert_eq!(status.road_segments_count, 0);
        assert_eq!(status.speed_readings_count, 0);
        assert_eq!(status.traffic_records_count, 0);
        assert_eq!(status.classifications_count, 3);
    }
}
