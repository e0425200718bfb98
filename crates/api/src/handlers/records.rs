use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use roadwatch_core::RoadwatchError;
use roadwatch_core::model::record::{RejectedRecord, TrafficRecord, TrafficRecordInput};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::wire::RecordIngestResponse;
use crate::{ApiState, auth};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    license_plate: Option<String>,
}

pub async fn list(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<TrafficRecord>>, ApiError> {
    auth::require_admin(&state, &headers)?;
    Ok(Json(state.store.list_records(query.license_plate.as_deref())?))
}

/// Bulk ingestion. The body must be a JSON array; each element is validated
/// on its own, so one bad record never sinks the batch. Responds 201 with
/// the created records and the rejected inputs, even when every record was
/// rejected.
pub async fn create(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<RecordIngestResponse>), ApiError> {
    auth::require_api_key(&state, &headers)?;

    let Value::Array(elements) = body else {
        return Err(RoadwatchError::Validation(
            "expected a JSON array of traffic records".to_string(),
        )
        .into());
    };

    let mut inputs = Vec::with_capacity(elements.len());
    let mut malformed = Vec::new();
    for element in elements {
        match serde_json::from_value::<TrafficRecordInput>(element.clone()) {
            Ok(input) => inputs.push(input),
            // The raw element is echoed back so the caller can see exactly
            // which payload failed.
            Err(e) => malformed.push(RejectedRecord {
                input: element,
                reason: format!("malformed record: {e}"),
            }),
        }
    }

    let mut outcome = state.store.ingest_records(&inputs)?;
    outcome.rejected.extend(malformed);

    Ok((
        StatusCode::CREATED,
        Json(RecordIngestResponse {
            data: outcome.created,
            invalid_inputs: outcome.rejected,
        }),
    ))
}

pub async fn retrieve(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<TrafficRecord>, ApiError> {
    auth::require_admin(&state, &headers)?;
    Ok(Json(state.store.get_record(id)?))
}

pub async fn remove(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    auth::require_admin(&state, &headers)?;
    state.store.delete_record(id)?;
    Ok(StatusCode::NO_CONTENT)
}
