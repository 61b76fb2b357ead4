//! HTTP routes and handlers

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::state::AppState;
use toxiscan_core::{ErrorResponse, PredictRequest, PredictResponse, StatusResponse};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status() -> Json<StatusResponse> {
    metrics::counter!("toxiscan_requests_total", "route" => "status").increment(1);
    Json(StatusResponse::running())
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

/// Score the `text` field of a JSON body.
///
/// The body is parsed by hand so that every malformed request, whatever the
/// content type, gets the same 400 payload.
async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, AppError> {
    metrics::counter!("toxiscan_requests_total", "route" => "predict").increment(1);

    let request = parse_predict_request(&body)?;
    debug!(chars = request.text.chars().count(), "Scoring text");

    let prediction = state.classifier.classify(&request.text).await?;

    metrics::histogram!("toxiscan_inference_latency_us").record(prediction.latency_us as f64);
    metrics::counter!(
        "toxiscan_predictions_total",
        "prediction" => prediction.label.as_str()
    )
    .increment(1);

    Ok(Json(prediction.to_response()))
}

fn parse_predict_request(body: &[u8]) -> Result<PredictRequest, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected prediction request: {}", e);
        AppError::MissingText
    })
}

async fn fallback() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    MissingText,
    Inference(toxiscan_core::Error),
}

impl From<toxiscan_core::Error> for AppError {
    fn from(err: toxiscan_core::Error) -> Self {
        AppError::Inference(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MissingText => {
                metrics::counter!("toxiscan_errors_total", "kind" => "missing_text").increment(1);
                (StatusCode::BAD_REQUEST, ErrorResponse::missing_text())
            }
            AppError::Inference(err) => {
                error!("Prediction failed: {}", err);
                metrics::counter!("toxiscan_errors_total", "kind" => err.kind()).increment(1);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(err.to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
