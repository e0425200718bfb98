use duckdb::params;
use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_core::model::classification::{self, TrafficClassification};

use crate::Store;

impl Store {
    /// All tiers ordered by ascending min_speed, null bound first.
    pub fn list_classifications(&self) -> Result<Vec<TrafficClassification>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, min_speed, max_speed FROM traffic_classifications
                 ORDER BY min_speed ASC NULLS FIRST, id ASC",
            )
            .map_err(|e| RoadwatchError::Store(format!("prepare tiers failed: {e}")))?;

        let rows = stmt
            .query_map([], classification_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query tiers failed: {e}")))?;

        let mut tiers = Vec::new();
        for row in rows {
            tiers.push(row.map_err(|e| RoadwatchError::Store(format!("map tier failed: {e}")))?);
        }
        Ok(tiers)
    }

    pub fn get_classification_by_name(
        &self,
        name: &str,
    ) -> Result<Option<TrafficClassification>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, min_speed, max_speed FROM traffic_classifications
                 WHERE name = ?",
            )
            .map_err(|e| RoadwatchError::Store(format!("prepare tier lookup failed: {e}")))?;

        let mut rows = stmt
            .query_map(params![name], classification_from_row)
            .map_err(|e| RoadwatchError::Store(format!("query tier failed: {e}")))?;

        rows.next()
            .transpose()
            .map_err(|e| RoadwatchError::Store(format!("map tier failed: {e}")))
    }

    /// First tier containing the speed, scanning by ascending min_speed.
    pub fn resolve_classification(&self, speed: f64) -> Result<Option<TrafficClassification>> {
        let tiers = self.list_classifications()?;
        Ok(classification::classify(&tiers, speed).cloned())
    }
}

fn classification_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<TrafficClassification> {
    Ok(TrafficClassification {
        id: row.get::<_, i64>(0)?,
        name: row.get::<_, String>(1)?,
        min_speed: row.get::<_, Option<f64>>(2)?,
        max_speed: row.get::<_, Option<f64>>(3)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::Store;

    #[test]
    fn default_tiers_are_seeded_in_order() {
        let store = Store::open_in_memory().unwrap();
        let tiers = store.list_classifications().unwrap();
        let names: Vec<&str> = tiers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["LOW", "MEDIUM", "HIGH"]);
    }

    #[test]
    fn resolves_boundary_and_out_of_range_speeds() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(
            store.resolve_classification(21.0).unwrap().unwrap().name,
            "MEDIUM"
        );
        assert_eq!(
            store.resolve_classification(999.0).unwrap().unwrap().name,
            "HIGH"
        );
        assert!(store.resolve_classification(-5.0).unwrap().is_none());
    }

    #[test]
    fn lookup_by_name_is_exact() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_classification_by_name("LOW").unwrap().is_some());
        assert!(store.get_classification_by_name("GRIDLOCK").unwrap().is_none());
    }
}
