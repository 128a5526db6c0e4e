use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use maternal_risk_core::{PredictionService, RawRecord, RiskCoreError};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

const NO_INPUT: &str = "No input data provided";
const MISSING_FIELDS: &str = "Missing required fields";
const INTERNAL_ERROR: &str = "Internal server error";

pub struct AppState {
    pub service: Arc<PredictionService>,
    pub start_time: Instant,
    pub req_count: AtomicU64,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
            req_count: AtomicU64::new(0),
        }
    }

    fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct PredictResponse {
    prediction: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    run_id: String,
    labels: Vec<String>,
    feature_count: usize,
    uptime_secs: u64,
    req_total: u64,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unprocessable<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

impl From<RiskCoreError> for ApiError {
    fn from(err: RiskCoreError) -> Self {
        match err {
            RiskCoreError::MissingFields(fields) => {
                debug!(?fields, "rejected request with missing fields");
                Self::bad_request(MISSING_FIELDS)
            }
            err if err.is_validation() => Self::bad_request(err.to_string()),
            err @ RiskCoreError::UnknownCategory { .. } => {
                warn!(%err, "input outside the fitted categories");
                Self::unprocessable(err.to_string())
            }
            err => {
                error!(%err, "prediction failed");
                Self::internal(INTERNAL_ERROR)
            }
        }
    }
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = bind_listener(addr).await?;
    info!("Prediction service listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind HTTP listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind HTTP listener on {addr}"))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/predict", post(handle_predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let req_total = state.record_request();
    Json(HealthResponse {
        status: "ok",
        run_id: state.service.run_id().to_string(),
        labels: state.service.labels().to_vec(),
        feature_count: state.service.feature_count(),
        uptime_secs: state.uptime_seconds(),
        req_total,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The body is read raw so that absent, empty and malformed payloads all get
/// the same answer.
async fn handle_predict(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    state.record_request();

    let object = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(ApiError::bad_request(NO_INPUT)),
    };

    let record = RawRecord::from_json_object(&object)?;
    let prediction = state.service.predict(&record)?;

    debug!(label = %prediction.label, "served prediction");
    Ok(Json(PredictResponse {
        prediction: prediction.label,
    }))
}
