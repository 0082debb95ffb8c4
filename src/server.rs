use crate::codec::{OutputFormat, JPEG_QUALITY};
use crate::config::Config;
use crate::enhance::{self, Outcome, Stage};
use crate::error::EnhanceError;
use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

pub const APPLIED_HEADER: &str = "x-enhancement-applied";
pub const TIME_HEADER: &str = "x-processing-time-ms";

/// Allowance for multipart boundaries, part headers and the `format` field
/// on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub stages: Vec<&'static str>,
    pub jpeg_quality: u8,
    pub output_formats: Vec<&'static str>,
    pub default_format: OutputFormat,
    pub max_file_size_bytes: usize,
}

/// Build the router; split out from `run` so tests can drive it directly
pub fn router(config: Config) -> Router {
    let max_file_size = config.max_file_size;
    let max_concurrent = config.max_concurrent;

    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route(
            "/enhance",
            post(handle_enhance).layer(ConcurrencyLimitLayer::new(max_concurrent)),
        )
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size.saturating_add(MULTIPART_OVERHEAD)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle enhancement requests
///
/// Responds with the enhanced image, or with the uploaded bytes unchanged
/// when no stage could be applied.
async fn handle_enhance(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, EnhanceError> {
    let start = Instant::now();

    let max_file_size = state.config.max_file_size;
    let mut file_data: Option<Bytes> = None;
    let mut format = OutputFormat::default();

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size, "Failed to parse multipart"))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                file_data = Some(field.bytes().await.map_err(|e| {
                    multipart_error(e, max_file_size, "Failed to read file data")
                })?);
            }
            "format" => {
                let value = field.text().await.map_err(|e| {
                    EnhanceError::InvalidRequest(format!("Invalid format: {}", e))
                })?;
                format = value.trim().parse().map_err(EnhanceError::InvalidRequest)?;
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(EnhanceError::MissingFile)?;

    if data.len() > max_file_size {
        return Err(EnhanceError::ImageTooLarge {
            size: data.len(),
            max: max_file_size,
        });
    }

    let input = data.clone();
    let outcome = tokio::task::spawn_blocking(move || enhance::enhance_bytes(&input, format))
        .await
        .map_err(|e| EnhanceError::Internal(format!("Enhancement task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    let applied = outcome.applied();
    let (body, content_type) = match outcome {
        Outcome::Enhanced(enhanced) => {
            tracing::info!(
                "Enhancement completed in {}ms (pipeline {}ms), {} -> {} bytes",
                processing_time_ms,
                enhanced.enhancement.total_time_ms,
                data.len(),
                enhanced.bytes.len()
            );
            (
                Body::from(enhanced.bytes),
                enhanced.format.mime_type(),
            )
        }
        Outcome::PassThrough(enhancement) => {
            tracing::warn!(
                "Returning upload unchanged, skipped stages: {}",
                enhancement.skip_summary()
            );
            let content_type = image::guess_format(&data)
                .map(|f| f.to_mime_type())
                .unwrap_or("application/octet-stream");
            (Body::from(data), content_type)
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
        .header(APPLIED_HEADER, if applied { "true" } else { "false" })
        .header(TIME_HEADER, processing_time_ms.to_string())
        .body(body)
        .map_err(|e| EnhanceError::Internal(format!("Failed to build response: {}", e)))
}

/// The body limit surfaces as a multipart error; keep it a size error
fn multipart_error(err: MultipartError, max_file_size: usize, context: &str) -> EnhanceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        EnhanceError::BodyTooLarge { max: max_file_size }
    } else {
        EnhanceError::InvalidRequest(format!("{}: {}", context, err))
    }
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        stages: Stage::ALL.iter().map(|s| s.name()).collect(),
        jpeg_quality: JPEG_QUALITY,
        output_formats: OutputFormat::ALL.iter().map(|f| f.as_str()).collect(),
        default_format: OutputFormat::default(),
        max_file_size_bytes: state.config.max_file_size,
    })
}
