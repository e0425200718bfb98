use serde::{Deserialize, Serialize};

/// A named speed range used to label current congestion. A null bound means
/// the range is unbounded on that side; both bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficClassification {
    pub id: i64,
    pub name: String,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
}

impl TrafficClassification {
    pub fn contains(&self, speed: f64) -> bool {
        if let Some(min) = self.min_speed
            && speed < min
        {
            return false;
        }
        if let Some(max) = self.max_speed
            && speed > max
        {
            return false;
        }
        true
    }
}

/// Returns the first tier whose range contains `speed`, scanning tiers by
/// ascending min_speed (a null min sorts first). Overlapping tiers are not
/// rejected; first match wins.
pub fn classify(tiers: &[TrafficClassification], speed: f64) -> Option<&TrafficClassification> {
    let mut ordered: Vec<&TrafficClassification> = tiers.iter().collect();
    ordered.sort_by(|a, b| {
        let a_min = a.min_speed.unwrap_or(f64::NEG_INFINITY);
        let b_min = b.min_speed.unwrap_or(f64::NEG_INFINITY);
        a_min.partial_cmp(&b_min).unwrap_or(std::cmp::Ordering::Equal)
    });
    ordered.into_iter().find(|tier| tier.contains(speed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<TrafficClassification> {
        vec![
            TrafficClassification {
                id: 1,
                name: "LOW".into(),
                min_speed: Some(0.0),
                max_speed: Some(20.0),
            },
            TrafficClassification {
                id: 2,
                name: "MEDIUM".into(),
                min_speed: Some(21.0),
                max_speed: Some(50.0),
            },
            TrafficClassification {
                id: 3,
                name: "HIGH".into(),
                min_speed: Some(51.0),
                max_speed: None,
            },
        ]
    }

    #[test]
    fn boundary_speed_maps_to_medium() {
        let tiers = tiers();
        assert_eq!(classify(&tiers, 21.0).unwrap().name, "MEDIUM");
        assert_eq!(classify(&tiers, 50.0).unwrap().name, "MEDIUM");
    }

    #[test]
    fn unbounded_top_tier_catches_large_speeds() {
        let tiers = tiers();
        assert_eq!(classify(&tiers, 999.0).unwrap().name, "HIGH");
    }

    #[test]
    fn negative_speed_has_no_classification() {
        let tiers = tiers();
        assert!(classify(&tiers, -5.0).is_none());
    }

    #[test]
    fn overlapping_tiers_resolve_by_ascending_min() {
        let overlapping = vec![
            TrafficClassification {
                id: 2,
                name: "B".into(),
                min_speed: Some(10.0),
                max_speed: Some(30.0),
            },
            TrafficClassification {
                id: 1,
                name: "A".into(),
                min_speed: Some(0.0),
                max_speed: Some(30.0),
            },
        ];
        assert_eq!(classify(&overlapping, 15.0).unwrap().name, "A");
    }

    #[test]
    fn null_min_is_unbounded_below() {
        let open = vec![TrafficClassification {
            id: 1,
            name: "ANY".into(),
            min_speed: None,
            max_speed: Some(10.0),
        }];
        assert_eq!(classify(&open, -100.0).unwrap().name, "ANY");
        assert!(classify(&open, 11.0).is_none());
    }
}
