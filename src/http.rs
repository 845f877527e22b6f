//! JSON query API.
//!
//! - `GET /imei/{imei}` last known position
//! - `GET /trip/{imei}` device marker followed by segmented trips
//! - `GET /trip/{imei}/{from}/{to}` raw history in `[from, to)`

use std::net::SocketAddr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::models::position::LastPosition;
use crate::processor::query_service::{self, QueryError, QueryService, TripHistory};

#[derive(Clone)]
pub struct AppState {
    pub queries: QueryService,
}

type ApiError = (StatusCode, Json<Value>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/imei/:imei", get(last_position))
        .route("/trip/:imei", get(trips))
        .route("/trip/:imei/:from/:to", get(trip_range))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP query API listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn last_position(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<Json<LastPosition>, ApiError> {
    match state.queries.last_position(&imei).await {
        Ok(Some(position)) => Ok(Json(position)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No position known for device '{}'", imei) })),
        )),
        Err(e) => Err(api_error(e)),
    }
}

pub async fn trips(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<Json<TripHistory>, ApiError> {
    let history = state.queries.trip_history(&imei, None).await.map_err(api_error)?;
    Ok(Json(history))
}

pub async fn trip_range(
    State(state): State<AppState>,
    Path((imei, from, to)): Path<(String, String, String)>,
) -> Result<Json<TripHistory>, ApiError> {
    let range = query_service::parse_range(&from, &to).map_err(api_error)?;
    let history = state
        .queries
        .trip_history(&imei, Some(range))
        .await
        .map_err(api_error)?;
    Ok(Json(history))
}

fn api_error(e: QueryError) -> ApiError {
    let status = match &e {
        QueryError::InvalidImei(_) | QueryError::InvalidTimestamp(_) | QueryError::InvalidRange { .. } => {
            warn!("Rejected query: {}", e);
            StatusCode::BAD_REQUEST
        }
        QueryError::Store(_) => {
            error!("Query failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": e.to_string() })))
}
