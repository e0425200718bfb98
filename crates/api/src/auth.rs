use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use roadwatch_core::error::{Result, RoadwatchError};

use crate::ApiState;

const MISSING_CREDENTIALS: &str = "Authentication credentials were not provided.";
const INVALID_CREDENTIALS: &str = "Invalid authentication credentials.";

/// Sensor ingestion credential: `Authorization: API-Key <key>`.
pub fn require_api_key(state: &ApiState, headers: &HeaderMap) -> Result<()> {
    require_scheme(state.api_key.as_deref(), headers, "API-Key")
}

/// Staff credential for mutations and record reads:
/// `Authorization: Bearer <token>`.
pub fn require_admin(state: &ApiState, headers: &HeaderMap) -> Result<()> {
    require_scheme(state.admin_token.as_deref(), headers, "Bearer")
}

/// Guards fail closed: a route needing an unconfigured credential can never
/// be satisfied.
fn require_scheme(expected: Option<&str>, headers: &HeaderMap, scheme: &str) -> Result<()> {
    let Some(expected) = expected else {
        return Err(RoadwatchError::Forbidden(MISSING_CREDENTIALS.to_string()));
    };

    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| RoadwatchError::Forbidden(MISSING_CREDENTIALS.to_string()))?;

    let presented = header
        .strip_prefix(scheme)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
        .ok_or_else(|| RoadwatchError::Forbidden(INVALID_CREDENTIALS.to_string()))?;

    if presented != expected {
        return Err(RoadwatchError::Forbidden(INVALID_CREDENTIALS.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_matching_credential() {
        let headers = headers_with("API-Key sesame");
        assert!(require_scheme(Some("sesame"), &headers, "API-Key").is_ok());
    }

    #[test]
    fn rejects_missing_wrong_and_misschemed_headers() {
        assert!(require_scheme(Some("sesame"), &HeaderMap::new(), "API-Key").is_err());
        let wrong = headers_with("API-Key open");
        assert!(require_scheme(Some("sesame"), &wrong, "API-Key").is_err());
        let bearer = headers_with("Bearer sesame");
        assert!(require_scheme(Some("sesame"), &bearer, "API-Key").is_err());
    }

    #[test]
    fn fails_closed_when_unconfigured() {
        let headers = headers_with("API-Key sesame");
        assert!(require_scheme(None, &headers, "API-Key").is_err());
    }
}
