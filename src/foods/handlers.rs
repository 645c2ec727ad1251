use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    errors::{bad_request, not_found, ApiError},
    nutrition::catalog::{FoodCategory, FoodEntry, GiCategory},
    state::AppState,
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(search_foods))
        .route("/foods/:name", get(get_food))
}

#[derive(Debug, Deserialize)]
pub struct FoodQuery {
    pub query: Option<String>,
    pub category: Option<String>,
}

/// Catalog row plus its derived GI band.
#[derive(Debug, Serialize)]
pub struct FoodView {
    #[serde(flatten)]
    pub food: FoodEntry,
    pub gi_category: Option<GiCategory>,
}

impl From<&FoodEntry> for FoodView {
    fn from(food: &FoodEntry) -> Self {
        Self {
            gi_category: food.gi_category(),
            food: food.clone(),
        }
    }
}

#[instrument(skip(state))]
pub async fn search_foods(
    State(state): State<AppState>,
    Query(q): Query<FoodQuery>,
) -> Result<Json<Vec<FoodView>>, ApiError> {
    let category = q
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(str::parse::<FoodCategory>)
        .transpose()
        .map_err(bad_request)?;
    let hits = state.catalog.search(q.query.as_deref(), category);
    debug!(hits = hits.len(), "catalog search");
    Ok(Json(hits.into_iter().map(FoodView::from).collect()))
}

/// Exact, synonym or partial match on the food name.
#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<FoodView>, ApiError> {
    state
        .catalog
        .lookup(&name)
        .map(|f| Json(FoodView::from(f)))
        .ok_or_else(|| not_found(format!("Food not found: {name}")))
}
