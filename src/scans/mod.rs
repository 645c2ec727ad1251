pub mod detector;
pub mod handlers;
pub mod services;
pub mod validator;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::scan_routes()
}
