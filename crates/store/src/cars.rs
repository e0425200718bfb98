use std::collections::{BTreeSet, HashMap};

use duckdb::params;
use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_core::model::car::Car;

use crate::Store;

impl Store {
    pub fn list_cars(&self) -> Result<Vec<Car>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, license_plate FROM cars ORDER BY id ASC")
            .map_err(|e| RoadwatchError::Store(format!("prepare cars failed: {e}")))?;

        let rows = stmt
            .query_map([], car_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query cars failed: {e}")))?;

        let mut cars = Vec::new();
        for row in rows {
            cars.push(row.map_err(|e| RoadwatchError::Store(format!("map car failed: {e}")))?);
        }
        Ok(cars)
    }

    /// Fetches cars for the given normalized plates, creating the missing
    /// ones. Ingestion calls this once per batch so repeated plates resolve
    /// to one car.
    pub fn get_or_create_cars(&self, plates: &BTreeSet<String>) -> Result<HashMap<String, Car>> {
        let mut cars = HashMap::new();
        if plates.is_empty() {
            return Ok(cars);
        }

        {
            let conn = self.conn();
            let placeholders = vec!["?"; plates.len()].join(", ");
            let sql = format!(
                "SELECT id, license_plate FROM cars WHERE license_plate IN ({placeholders})"
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| RoadwatchError::Store(format!("prepare car lookup failed: {e}")))?;

            let rows = stmt
                .query_map(
                    duckdb::params_from_iter(plates.iter()),
                    car_from_row,
                )
                .map_err(|e| RoadwatchError::Store(format!("query car lookup failed: {e}")))?;

            for row in rows {
                let car =
                    row.map_err(|e| RoadwatchError::Store(format!("map car failed: {e}")))?;
                cars.insert(car.license_plate.clone(), car);
            }
        }

        for plate in plates {
            if cars.contains_key(plate) {
                continue;
            }
            let conn = self.conn();
            let id = conn
                .query_row(
                    "INSERT INTO cars (id, license_plate)
                     VALUES (nextval('car_id_seq'), ?)
                     RETURNING id",
                    params![plate],
                    |row| row.get::<_, i64>(0),
                )
                .map_err(|e| RoadwatchError::Store(format!("insert car failed: {e}")))?;
            cars.insert(
                plate.clone(),
                Car {
                    id,
                    license_plate: plate.clone(),
                },
            );
        }

        Ok(cars)
    }
}

fn car_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Car> {
    Ok(Car {
        id: row.get::<_, i64>(0)?,
        license_plate: row.get::<_, String>(1)?,
    })
}
