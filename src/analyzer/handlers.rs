use axum::{
    extract::{DefaultBodyLimit, Query, State},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use super::{
    dto::{AnalyzeRequest, AnalyzeResponse, CreateFoodLogRequest, FoodLogCreated, Pagination},
    repo,
    repo_types::{FoodLog, NutritionalGapRow},
    services,
};
use crate::{
    ai::InlineImage,
    auth::jwt::AuthUser,
    errors::{bad_gateway, bad_request, internal, ApiError},
    scans::handlers::MAX_UPLOAD_BYTES,
    state::AppState,
    storage::store_food_image,
};

pub fn analyzer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/analyzer/analyze",
            // base64 inflates the image by a third
            post(analyze).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES * 4 / 3 + 1024)),
        )
        .route("/food-logs", post(create_food_log).get(list_food_logs))
        .route("/nutritional-gaps", get(list_gaps))
}

/// POST /analyzer/analyze
#[instrument(skip(state, payload))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (bytes, mime) = payload.decode().map_err(bad_request)?;
    if bytes.is_empty() {
        return Err(bad_request("Empty image"));
    }
    let image = InlineImage::from_bytes(&bytes, mime.clone());

    let analysis = services::analyze_image(state.ai.vision.as_ref(), image)
        .await
        .map_err(|e| bad_gateway(e, "Failed to analyze food image"))?;

    let image_url = if payload.store_image {
        Some(
            store_food_image(state.storage.as_ref(), user_id, Bytes::from(bytes), &mime)
                .await
                .map_err(internal)?,
        )
    } else {
        None
    };

    Ok(Json(AnalyzeResponse {
        analysis,
        image_url,
    }))
}

/// POST /food-logs
#[instrument(skip(state, payload))]
pub async fn create_food_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateFoodLogRequest>,
) -> Result<Json<FoodLogCreated>, ApiError> {
    payload.validate().map_err(|msg| {
        warn!(%user_id, %msg, "invalid food log");
        bad_request(msg)
    })?;

    let food_log = repo::insert_food_log(&state.db, user_id, &payload)
        .await
        .map_err(internal)?;
    info!(%user_id, log_id = %food_log.id, meal_type = %food_log.meal_type, "food log saved");

    // the log is committed; a failed refresh must not invite a duplicate retry
    let refresh = match services::refresh_gaps(&state.db, state.ai.vision.as_ref(), user_id).await
    {
        Ok(r) => Some(r),
        Err(e) => {
            warn!(
                %user_id,
                log_id = %food_log.id,
                error = %e,
                "gap refresh failed after saving food log"
            );
            None
        }
    };

    Ok(Json(FoodLogCreated::new(food_log, refresh)))
}

/// GET /food-logs?limit=&offset=
#[instrument(skip(state))]
pub async fn list_food_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<FoodLog>>, ApiError> {
    let (limit, offset) = p.clamped();
    let logs = repo::list_food_logs(&state.db, user_id, limit, offset)
        .await
        .map_err(internal)?;
    Ok(Json(logs))
}

/// GET /nutritional-gaps
#[instrument(skip(state))]
pub async fn list_gaps(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<NutritionalGapRow>>, ApiError> {
    let gaps = repo::list_gaps(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(gaps))
}
