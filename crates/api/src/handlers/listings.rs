use axum::Json;
use axum::extract::State;
use roadwatch_core::model::car::Car;
use roadwatch_core::model::classification::TrafficClassification;
use roadwatch_core::model::sensor::Sensor;
use roadwatch_store::StoreStatus;

use crate::ApiState;
use crate::error::ApiError;

pub async fn classifications(
    State(state): State<ApiState>,
) -> Result<Json<Vec<TrafficClassification>>, ApiError> {
    Ok(Json(state.store.list_classifications()?))
}

pub async fn sensors(State(state): State<ApiState>) -> Result<Json<Vec<Sensor>>, ApiError> {
    Ok(Json(state.store.list_sensors()?))
}

pub async fn cars(State(state): State<ApiState>) -> Result<Json<Vec<Car>>, ApiError> {
    Ok(Json(state.store.list_cars()?))
}

pub async fn status(State(state): State<ApiState>) -> Result<Json<StoreStatus>, ApiError> {
    Ok(Json(state.store.status()?))
}
