use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoadwatchError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Car {
    pub id: i64,
    pub license_plate: String,
}

fn plate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9]{4,12}$").expect("static pattern compiles"))
}

/// Uppercases and validates a raw license plate string.
pub fn normalize_license_plate(raw: &str) -> Result<String> {
    let plate = raw.trim().to_ascii_uppercase();
    if !plate_pattern().is_match(&plate) {
        return Err(RoadwatchError::Validation(format!(
            "invalid license plate: {raw}"
        )));
    }
    Ok(plate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_license_plate(" aa00aa ").unwrap(), "AA00AA");
    }

    #[test]
    fn rejects_bad_plates() {
        assert!(normalize_license_plate("").is_err());
        assert!(normalize_license_plate("a!").is_err());
        assert!(normalize_license_plate("THISPLATEISTOOLONG").is_err());
    }
}
