use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use roadwatch_core::model::segment::RoadSegmentParams;
use serde::Deserialize;

use crate::error::ApiError;
use crate::wire::{SegmentFeature, SegmentPatch};
use crate::{ApiState, auth};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    classification: Option<String>,
}

pub async fn list(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SegmentFeature>>, ApiError> {
    let segments = state.store.list_segments(query.classification.as_deref())?;
    Ok(Json(segments.iter().map(SegmentFeature::from_model).collect()))
}

pub async fn create(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(feature): Json<SegmentFeature>,
) -> Result<(StatusCode, Json<SegmentFeature>), ApiError> {
    auth::require_admin(&state, &headers)?;
    let params = feature.into_params()?;
    let created = state.store.create_segment(&params)?;
    Ok((StatusCode::CREATED, Json(SegmentFeature::from_model(&created))))
}

pub async fn retrieve(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<SegmentFeature>, ApiError> {
    let segment = state.store.get_segment(id)?;
    Ok(Json(SegmentFeature::from_model(&segment)))
}

pub async fn replace(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(feature): Json<SegmentFeature>,
) -> Result<Json<SegmentFeature>, ApiError> {
    auth::require_admin(&state, &headers)?;
    let params = feature.into_params()?;
    let updated = state.store.update_segment(id, &params)?;
    Ok(Json(SegmentFeature::from_model(&updated)))
}

pub async fn patch(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<SegmentPatch>,
) -> Result<Json<SegmentFeature>, ApiError> {
    auth::require_admin(&state, &headers)?;
    let existing = state.store.get_segment(id)?;

    let geometry = match body.geometry {
        Some(geometry) => geometry.into_line()?,
        None => existing.geometry,
    };
    let road_length = body
        .properties
        .and_then(|p| p.road_length)
        .unwrap_or(existing.road_length);

    let updated = state.store.update_segment(
        id,
        &RoadSegmentParams {
            geometry,
            road_length,
        },
    )?;
    Ok(Json(SegmentFeature::from_model(&updated)))
}

pub async fn remove(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    auth::require_admin(&state, &headers)?;
    state.store.delete_segment(id)?;
    Ok(StatusCode::NO_CONTENT)
}
