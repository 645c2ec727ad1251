use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{validate_content, FoodAnalysisRequest, SendMessageRequest},
    repo::{Conversation, Message},
    services::{self, ChatError, ChatReply},
};
use crate::{
    auth::jwt::AuthUser,
    errors::{bad_gateway, bad_request, internal, not_found, ApiError},
    state::AppState,
};

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/conversations/current", get(current_conversation))
        .route("/conversations/:id/messages", get(list_messages))
        .route("/chat/messages", post(send_message))
        .route("/chat/food-analysis", post(send_food_analysis))
}

fn chat_error(e: ChatError) -> ApiError {
    match e {
        ChatError::ProfileNotFound => not_found("Profile not found"),
        ChatError::Ai(e) => bad_gateway(e, "Failed to generate response"),
        ChatError::Store(e) => internal(e),
    }
}

#[instrument(skip(state))]
pub async fn current_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Conversation>, ApiError> {
    Conversation::get_or_create(&state.db, user_id)
        .await
        .map(Json)
        .map_err(internal)
}

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let conversation = Conversation::find_owned(&state.db, id, user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Conversation not found"))?;
    let messages = Message::list(&state.db, conversation.id)
        .await
        .map_err(internal)?;
    Ok(Json(messages))
}

#[instrument(skip(state, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    validate_content("content", &payload.content).map_err(|msg| {
        warn!(%user_id, %msg, "rejected chat message");
        bad_request(msg)
    })?;
    let reply = services::send_message(
        &state.db,
        state.ai.chat.as_ref(),
        user_id,
        payload.content.trim(),
        payload.image_url.as_deref(),
    )
    .await
    .map_err(chat_error)?;
    Ok(Json(reply))
}

#[instrument(skip(state, payload))]
pub async fn send_food_analysis(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<FoodAnalysisRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    validate_content("prompt", &payload.prompt).map_err(bad_request)?;
    if payload.scan_output.is_null() {
        return Err(bad_request("scan_output is required"));
    }
    let reply = services::send_food_analysis(
        &state.db,
        state.ai.chat.as_ref(),
        user_id,
        payload.prompt.trim(),
        &payload.scan_output,
        payload.image_url.as_deref(),
    )
    .await
    .map_err(chat_error)?;
    Ok(Json(reply))
}
