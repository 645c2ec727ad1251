use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{dto::OnboardingRequest, repo, repo_types::Profile};
use crate::{
    auth::jwt::AuthUser,
    errors::{bad_request, internal, not_found, ApiError},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/onboarding", put(submit_onboarding))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, ApiError> {
    repo::find(&state.db, user_id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Profile not found"))
}

#[instrument(skip(state, payload))]
pub async fn submit_onboarding(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<OnboardingRequest>,
) -> Result<Json<Profile>, ApiError> {
    let update = payload.validate().map_err(|msg| {
        warn!(%user_id, %msg, "invalid onboarding answers");
        bad_request(msg)
    })?;

    let profile = repo::apply_onboarding(&state.db, user_id, &update)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Profile not found"))?;

    info!(%user_id, has_diabetes = profile.has_diabetes, "onboarding completed");
    Ok(Json(profile))
}
