//! HTTP surface for the wave-front engine.
//!
//! # Endpoints
//! - `GET /api/wave-front?lat=-33.03&lon=-71.63`
//! - `POST /api/wave-front` with `{"latitude": -33.03, "longitude": -71.63}`
//! - `GET /api/usage`: provider call counters for the current UTC day
//! - `GET /health`
//!
//! Malformed or out-of-range coordinates get a `400` with a JSON error body.
//! Anything that goes wrong after validation still produces a profile.

use crate::accounting::{CallLedger, UsageSnapshot};
use crate::profile::WaveFrontService;
use crate::{GeoPoint, WaveFrontProfile};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Request validation failures; the only errors a caller can see.
#[derive(Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("missing or malformed parameter: {0}")]
    MissingParameter(String),

    #[error("coordinate out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("Rejected wave-front request: {}", self);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Query string form: `?lat=..&lon=..`
#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// JSON body form
#[derive(Debug, Deserialize)]
pub struct CoordinateBody {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    distances_nm: Vec<f64>,
}

/// Check that a coordinate is finite and within global bounds.
pub fn validate_coordinate(latitude: f64, longitude: f64) -> Result<GeoPoint, ApiError> {
    let in_range = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);

    if in_range {
        Ok(GeoPoint::new(latitude, longitude))
    } else {
        Err(ApiError::InvalidCoordinate {
            latitude,
            longitude,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WaveFrontService>,
    pub ledger: Arc<CallLedger>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/wave-front",
            get(wave_front_from_query).post(wave_front_from_body),
        )
        .route("/api/usage", get(usage))
        .route("/health", get(health))
        .with_state(state)
}

async fn wave_front_from_query(
    State(state): State<AppState>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Result<Json<WaveFrontProfile>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::MissingParameter(e.body_text()))?;
    let latitude = query
        .lat
        .ok_or_else(|| ApiError::MissingParameter("lat".to_string()))?;
    let longitude = query
        .lon
        .ok_or_else(|| ApiError::MissingParameter("lon".to_string()))?;

    let point = validate_coordinate(latitude, longitude)?;
    Ok(Json(
        state.service.profile(point.latitude, point.longitude).await,
    ))
}

async fn wave_front_from_body(
    State(state): State<AppState>,
    body: Result<Json<CoordinateBody>, JsonRejection>,
) -> Result<Json<WaveFrontProfile>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::MissingParameter(e.body_text()))?;
    let point = validate_coordinate(body.latitude, body.longitude)?;
    Ok(Json(
        state.service.profile(point.latitude, point.longitude).await,
    ))
}

async fn usage(State(state): State<AppState>) -> Json<UsageSnapshot> {
    Json(state.ledger.snapshot())
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        distances_nm: state.service.distances().to_vec(),
    })
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Wave front API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationEngine;
    use crate::orchestrator::Orchestrator;
    use crate::sources::WaveSource;
    use crate::tests::mocks::StaticSource;
    use crate::ProviderClass;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let sources: Vec<Arc<dyn WaveSource>> = vec![Arc::new(StaticSource::new(
            "copernicus",
            ProviderClass::OfficialReanalysis,
            2.0,
        ))];
        let ledger = Arc::new(CallLedger::new());
        let orchestrator = Orchestrator::new(sources, Duration::from_secs(1), ledger.clone());
        let service = WaveFrontService::new(orchestrator, CalibrationEngine::new(-4), &[1.0, 2.0, 5.0]);
        router(AppState {
            service: Arc::new(service),
            ledger,
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validate_coordinate_bounds() {
        assert!(validate_coordinate(-33.0, -71.6).is_ok());
        assert!(validate_coordinate(90.0, 180.0).is_ok());
        assert!(validate_coordinate(-91.0, 0.0).is_err());
        assert!(validate_coordinate(0.0, 181.0).is_err());
        assert!(validate_coordinate(f64::NAN, 0.0).is_err());
    }

    #[tokio::test]
    async fn test_get_returns_full_profile() {
        let response = app()
            .oneshot(
                Request::get("/api/wave-front?lat=-33.03&lon=-71.63")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let points = json["measurements"].as_array().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0]["distance_nm"], 1.0);
        assert_eq!(points[2]["distance_nm"], 5.0);
        assert_eq!(points[0]["quality"], "high");
        assert!(json["confidence"].as_f64().unwrap() <= 1.0);
    }

    #[tokio::test]
    async fn test_post_accepts_json_body() {
        let response = app()
            .oneshot(
                Request::post("/api/wave-front")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"latitude": -36.8, "longitude": -73.1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["coastal_point"]["latitude"], -36.8);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_parameters_are_400() {
        for uri in [
            "/api/wave-front?lat=-33.0",
            "/api/wave-front?lat=abc&lon=-71.6",
            "/api/wave-front?lat=-95&lon=-71.6",
        ] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let json = body_json(response).await;
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_400() {
        let response = app()
            .oneshot(
                Request::post("/api/wave-front")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"latitude": "south"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_edge_coordinates_yield_valid_offshore_points() {
        for uri in [
            "/api/wave-front?lat=90&lon=-70",
            "/api/wave-front?lat=-80&lon=-179.95",
        ] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");

            let json = body_json(response).await;
            for point in json["measurements"].as_array().unwrap() {
                let lon = point["coordinate"]["longitude"].as_f64().unwrap();
                assert!((-180.0..180.0).contains(&lon), "{uri}: {lon}");
            }
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }
}
