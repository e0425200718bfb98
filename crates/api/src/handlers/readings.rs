use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use roadwatch_core::model::reading::SpeedReading;
use serde::Deserialize;

use crate::error::ApiError;
use crate::{ApiState, auth};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    road_segment: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingBody {
    road_segment: i64,
    speed: f64,
}

/// Partial update body; `created_at` is never writable.
#[derive(Debug, Deserialize)]
pub struct ReadingPatch {
    #[serde(default)]
    road_segment: Option<i64>,
    #[serde(default)]
    speed: Option<f64>,
}

pub async fn list(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SpeedReading>>, ApiError> {
    Ok(Json(state.store.list_readings(query.road_segment)?))
}

pub async fn create(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ReadingBody>,
) -> Result<(StatusCode, Json<SpeedReading>), ApiError> {
    auth::require_admin(&state, &headers)?;
    let created = state.store.create_reading(body.road_segment, body.speed)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn retrieve(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<SpeedReading>, ApiError> {
    Ok(Json(state.store.get_reading(id)?))
}

pub async fn replace(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<ReadingBody>,
) -> Result<Json<SpeedReading>, ApiError> {
    auth::require_admin(&state, &headers)?;
    let updated = state.store.update_reading(id, body.road_segment, body.speed)?;
    Ok(Json(updated))
}

pub async fn patch(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<ReadingPatch>,
) -> Result<Json<SpeedReading>, ApiError> {
    auth::require_admin(&state, &headers)?;
    let existing = state.store.get_reading(id)?;
    let road_segment = body.road_segment.unwrap_or(existing.road_segment);
    let speed = body.speed.unwrap_or(existing.speed);
    let updated = state.store.update_reading(id, road_segment, speed)?;
    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    auth::require_admin(&state, &headers)?;
    state.store.delete_reading(id)?;
    Ok(StatusCode::NO_CONTENT)
}
