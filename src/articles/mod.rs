pub mod handlers;
pub mod library;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::article_routes()
}
