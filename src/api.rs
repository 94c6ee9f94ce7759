//! HTTP surface: route risk summaries.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::error::RouteError;
use crate::graph::{GeoNode, NavigationGraph};
use crate::risk::RngDraws;
use crate::segment::{segment_route, RouteSummary};
use crate::visibility::VisibilityEstimator;

pub struct AppState {
    pub nav_graph: NavigationGraph,
    pub visibility: VisibilityEstimator,
    pub max_radius_m: f64,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    /// `"lat,lon"`
    pub start: String,
    pub end: String,
}

pub enum ApiError {
    Route(RouteError),
    /// The blocking route worker panicked or was cancelled.
    Worker(String),
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        ApiError::Route(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Route(RouteError::InvalidCoordinates(_)) => {
                (StatusCode::BAD_REQUEST, "Invalid location coordinates.".to_string())
            }
            ApiError::Route(RouteError::NodeNotFound | RouteError::NoPath) => (
                StatusCode::NOT_FOUND,
                "No road path found. Try points closer together.".to_string(),
            ),
            ApiError::Route(other) => {
                error!(error = %other, "route computation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Server Error: {other}"))
            }
            ApiError::Worker(reason) => {
                error!(error = %reason, "route worker failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Server Error: {reason}"))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Parse `"lat,lon"` into a node position.
pub fn parse_coordinates(raw: &str) -> Result<GeoNode, RouteError> {
    let invalid = || RouteError::InvalidCoordinates(raw.to_string());
    let (lat, lon) = raw.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid());
    }
    Ok(GeoNode::new(lat, lon))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/get-route", post(get_route))
        .layer(cors)
        .with_state(state)
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<RouteSummary>, ApiError> {
    info!(start = %payload.start, end = %payload.end, "processing route");

    let start = parse_coordinates(&payload.start)?;
    let end = parse_coordinates(&payload.end)?;

    // A*, image analysis and scoring are all CPU-bound
    let worker = Arc::clone(&state);
    let summary = tokio::task::spawn_blocking(move || plan_and_segment(&worker, start, end))
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))??;

    info!(
        segments = summary.segments.len(),
        km = summary.total_distance_km,
        high = summary.stats.high,
        "route ready"
    );
    Ok(Json(summary))
}

fn plan_and_segment(state: &AppState, start: GeoNode, end: GeoNode) -> Result<RouteSummary, RouteError> {
    let route = state.nav_graph.plan(start, end, state.max_radius_m)?;
    let mut draws = RngDraws(rand::rng());
    segment_route(&state.nav_graph, &route.path, route.length_m, &state.visibility, &mut draws)
}
