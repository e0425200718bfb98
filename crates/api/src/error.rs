use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use roadwatch_core::RoadwatchError;
use serde_json::json;

/// Wraps the domain error so handlers can use `?` and still produce the
/// `{ "detail": ... }` body clients expect.
pub struct ApiError(RoadwatchError);

impl From<RoadwatchError> for ApiError {
    fn from(err: RoadwatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            RoadwatchError::Validation(msg)
            | RoadwatchError::Parse(msg)
            | RoadwatchError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RoadwatchError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            RoadwatchError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("not found: {msg}")),
            _ => {
                tracing::error!(error = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_statuses() {
        let cases = [
            (
                RoadwatchError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RoadwatchError::Forbidden("no".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                RoadwatchError::NotFound("road segment 7".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                RoadwatchError::Store("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
