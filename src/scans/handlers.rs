use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{instrument, warn};

use super::services::{ScanError, ScanPipeline, ScanReport};
use crate::{
    ai::InlineImage,
    auth::jwt::AuthUser,
    errors::{bad_gateway, bad_request, internal},
    profiles,
    state::AppState,
};

pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
/// Boundaries, part headers and small extra fields around the file.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/scan-food", post(scan_food))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES))
}

fn multipart_error(e: MultipartError) -> Response {
    (e.status(), e.body_text()).into_response()
}

/// POST /scan-food (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn scan_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<ScanReport>, Response> {
    let mut upload = None;
    while let Some(field) = mp.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "image/jpeg".into());
            let data = field.bytes().await.map_err(multipart_error)?;
            upload = Some((data, content_type));
            break;
        }
    }

    let (data, content_type) =
        upload.ok_or_else(|| bad_request("file is required").into_response())?;
    if data.is_empty() {
        return Err(bad_request("Empty image file").into_response());
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err((StatusCode::PAYLOAD_TOO_LARGE, "Image exceeds 20 MB").into_response());
    }
    let image = InlineImage::from_bytes(&data, &content_type);

    // personalization only; a failed lookup should not block the scan
    let profile = match profiles::repo::find(&state.db, user_id).await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, %user_id, "profile lookup failed, scanning without it");
            None
        }
    };

    let pipeline = ScanPipeline::from_state(&state);
    match pipeline.run(&image, profile.as_ref()).await {
        Ok(report) => Ok(Json(report)),
        Err(ScanError::NoFoods { detail }) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "No foods detected in image", "detail": detail })),
        )
            .into_response()),
        Err(ScanError::Detector(e)) => {
            if e.downcast_ref::<crate::ai::AiError>().is_some() {
                Err(bad_gateway(e, "Food detection failed").into_response())
            } else {
                Err(internal(e).into_response())
            }
        }
    }
}
