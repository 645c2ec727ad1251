use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use super::{
    dto::GenerateMealPlanRequest,
    repo::{self, MealPlanRecord},
    services,
};
use crate::{
    auth::jwt::AuthUser,
    errors::{bad_gateway, bad_request, internal, ApiError},
    profiles,
    state::AppState,
};

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new().route("/meal-plans", post(generate_meal_plan).get(list_meal_plans))
}

#[instrument(skip(state, payload))]
pub async fn generate_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<GenerateMealPlanRequest>,
) -> Result<Json<MealPlanRecord>, ApiError> {
    payload.validate().map_err(|msg| {
        warn!(%user_id, %msg, "invalid meal plan request");
        bad_request(msg)
    })?;

    let profile = profiles::repo::find(&state.db, user_id)
        .await
        .map_err(internal)?;
    let plan = services::generate(state.ai.vision.as_ref(), &payload, profile.as_ref())
        .await
        .map_err(|e| bad_gateway(e, "Failed to generate meal plan"))?;

    let preferences = Some(payload.preferences.trim()).filter(|p| !p.is_empty());
    let record = repo::insert(
        &state.db,
        user_id,
        payload.budget,
        payload.days,
        preferences,
        &plan,
    )
    .await
    .map_err(internal)?;
    info!(%user_id, plan_id = %record.id, "meal plan saved");
    Ok(Json(record))
}

#[instrument(skip(state))]
pub async fn list_meal_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<MealPlanRecord>>, ApiError> {
    repo::list(&state.db, user_id)
        .await
        .map(Json)
        .map_err(internal)
}
