//! HTTP resource endpoints for the traffic backend.
//!
//! Resources are served under `/api`: road segments (GeoJSON features),
//! speed readings, bulk-ingested traffic records, and read-only listings of
//! classifications, sensors, and cars. Mutations are guarded by shared
//! secrets from the configuration.

use std::net::SocketAddr;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use roadwatch_core::error::{Result, RoadwatchError};
use roadwatch_store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;

mod auth;
mod error;
mod handlers;
mod wire;

pub use error::ApiError;
pub use wire::{RecordIngestResponse, SegmentFeature};

#[derive(Clone)]
pub struct ApiState {
    pub store: Store,
    pub api_key: Option<String>,
    pub admin_token: Option<String>,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/road_segments",
            get(handlers::segments::list).post(handlers::segments::create),
        )
        .route(
            "/api/road_segments/{id}",
            get(handlers::segments::retrieve)
                .put(handlers::segments::replace)
                .patch(handlers::segments::patch)
                .delete(handlers::segments::remove),
        )
        .route(
            "/api/speed_readings",
            get(handlers::readings::list).post(handlers::readings::create),
        )
        .route(
            "/api/speed_readings/{id}",
            get(handlers::readings::retrieve)
                .put(handlers::readings::replace)
                .patch(handlers::readings::patch)
                .delete(handlers::readings::remove),
        )
        .route(
            "/api/traffic_records",
            get(handlers::records::list).post(handlers::records::create),
        )
        .route(
            "/api/traffic_records/{id}",
            get(handlers::records::retrieve).delete(handlers::records::remove),
        )
        .route("/api/classifications", get(handlers::listings::classifications))
        .route("/api/sensors", get(handlers::listings::sensors))
        .route("/api/cars", get(handlers::listings::cars))
        .route("/api/status", get(handlers::listings::status))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .on_request(tower_http::trace::DefaultOnRequest::new().level(Level::INFO))
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: ApiState) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RoadwatchError::Io(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(%addr, "http api listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| RoadwatchError::Internal(format!("http server failed: {e}")))
}
