//! HTTP Server for the Salesflow API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/pipeline`   | Upload a CSV and run the pipeline    |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{Multipart, State},
    http::{header, Method},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::PipelineResponse;
use crate::error::{ServerError, ServerResult};
use crate::transform::pipeline::{run_bytes, PipelineOptions};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub options: Arc<PipelineOptions>,
}

/// Build the router
pub fn router(options: PipelineOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let state = AppState {
        options: Arc::new(options),
    };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/pipeline", post(run_upload))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(
    port: u16,
    options: PipelineOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(options);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Salesflow server running on http://localhost:{}", port);
    println!("   POST /api/pipeline - Upload CSV and run the pipeline");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /health       - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "salesflow",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "pipeline": "POST /api/pipeline",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload a CSV (multipart field `file`) and run the full pipeline on it
async fn run_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<PipelineResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;

    log_info(format!(
        "New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    // The pipeline is synchronous; keep it off the async workers.
    let options = Arc::clone(&state.options);
    let run = tokio::task::spawn_blocking(move || run_bytes(&bytes, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(PipelineResponse::from(run)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_payload() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "salesflow");
    }

    #[test]
    fn test_router_builds() {
        let _ = router(PipelineOptions::default());
    }
}
