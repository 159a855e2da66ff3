use std::{sync::Arc, time::Instant};

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use procmetrics_core::{MetricDescriptor, TEXT_CONTENT_TYPE};
use tracing::error;

use crate::router::AdminState;

pub async fn prometheus_metrics(State(state): State<Arc<AdminState>>) -> Response {
    // Suppliers may read files, so rendering stays off the async workers.
    let registry = Arc::clone(&state.registry);
    let encoder = state.encoder;
    let payload = match tokio::task::spawn_blocking(move || encoder.render(&registry)).await {
        Ok(payload) => payload,
        Err(err) => {
            error!(error = %err, "metrics rendering task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(TEXT_CONTENT_TYPE),
    );

    response
}

pub async fn metric_catalog(State(state): State<Arc<AdminState>>) -> Json<Vec<MetricDescriptor>> {
    Json(state.registry.descriptors())
}

pub async fn track_api_metrics(
    State(state): State<Arc<AdminState>>,
    request: Request,
    next: Next,
) -> Response {
    let started_at = Instant::now();
    let method = request.method().as_str().to_string();

    let in_flight = state.api_metrics.track_in_flight();
    let response = next.run(request).await;
    drop(in_flight);

    state
        .api_metrics
        .record_request(&method, response.status().as_u16(), started_at.elapsed());

    response
}
