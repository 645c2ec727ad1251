use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use super::{
    dto::{HistoryQuery, ReadingHistory, RecordReadingRequest},
    repo::{self, BloodSugarReading},
    services::summarize,
};
use crate::{
    auth::jwt::AuthUser,
    errors::{bad_request, internal, ApiError},
    profiles::{
        self,
        repo_types::{DEFAULT_TARGET_MAX, DEFAULT_TARGET_MIN},
    },
    state::AppState,
};

pub fn blood_sugar_routes() -> Router<AppState> {
    Router::new().route("/blood-sugar", post(record_reading).get(reading_history))
}

#[instrument(skip(state, payload))]
pub async fn record_reading(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecordReadingRequest>,
) -> Result<Json<BloodSugarReading>, ApiError> {
    payload.validate().map_err(|msg| {
        warn!(%user_id, %msg, "invalid blood sugar reading");
        bad_request(msg)
    })?;
    let reading = repo::insert(&state.db, user_id, &payload)
        .await
        .map_err(internal)?;
    info!(%user_id, mg_dl = reading.reading_mg_dl, kind = %reading.reading_type, "blood sugar recorded");
    Ok(Json(reading))
}

#[instrument(skip(state))]
pub async fn reading_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<ReadingHistory>, ApiError> {
    let days = q.days();
    let since = OffsetDateTime::now_utc() - Duration::days(days);
    let readings = repo::list_since(&state.db, user_id, since)
        .await
        .map_err(internal)?;

    let target = profiles::repo::find(&state.db, user_id)
        .await
        .map_err(internal)?
        .map(|p| p.blood_sugar_target())
        .unwrap_or((DEFAULT_TARGET_MIN, DEFAULT_TARGET_MAX));
    let values: Vec<f64> = readings.iter().map(|r| r.reading_mg_dl).collect();
    let summary = summarize(&values, target);

    Ok(Json(ReadingHistory {
        days,
        readings,
        summary,
    }))
}
