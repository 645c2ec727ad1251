use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::library::{Article, ArticleCategory};
use crate::{
    errors::{bad_request, not_found, ApiError},
    state::AppState,
};

pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/:id", get(get_article))
}

#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    pub category: Option<String>,
}

/// List entry; the body is only served by the detail route.
#[derive(Debug, Serialize)]
pub struct ArticleSummary {
    pub id: u32,
    pub title: String,
    pub intro: String,
    pub category: ArticleCategory,
    pub tags: Vec<String>,
}

impl From<&Article> for ArticleSummary {
    fn from(a: &Article) -> Self {
        Self {
            id: a.id,
            title: a.title.clone(),
            intro: a.intro.clone(),
            category: a.category,
            tags: a.tags.clone(),
        }
    }
}

#[instrument(skip(state))]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(q): Query<ArticleQuery>,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    let category = q
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(str::parse::<ArticleCategory>)
        .transpose()
        .map_err(bad_request)?;
    let articles = state.articles.list(category);
    debug!(count = articles.len(), "articles listed");
    Ok(Json(articles.into_iter().map(ArticleSummary::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Article>, ApiError> {
    state
        .articles
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(format!("Article not found: {id}")))
}
