use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, is_valid_email, verify_password, MIN_PASSWORD_LEN},
        repo::User,
    },
    errors::{bad_request, internal, ApiError},
    profiles,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_tokens(state: &AppState, user: PublicUser) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id).map_err(internal)?;
    let refresh_token = keys.sign_refresh(user.id).map_err(internal)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

async fn onboarding_completed(state: &AppState, user_id: Uuid) -> Result<bool, ApiError> {
    let profile = profiles::repo::find(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(profile.map(|p| p.onboarding_completed).unwrap_or(false))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(bad_request("Invalid email"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(bad_request("Password too short"));
    }

    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let full_name = payload
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    // user and profile rows are created together or not at all
    let mut tx = state.db.begin().await.map_err(internal)?;
    let user = match User::create(&mut *tx, &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
        Err(e) => return Err(internal(e)),
    };
    profiles::repo::create_empty(&mut *tx, user.id, &user.email, full_name)
        .await
        .map_err(internal)?;
    tx.commit().await.map_err(internal)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let response = issue_tokens(
        &state,
        PublicUser {
            id: user.id,
            email: user.email,
            onboarding_completed: false,
        },
    )?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(bad_request("Invalid email"));
    }

    let user = match User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(internal)?
    {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash).map_err(internal)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let onboarding_completed = onboarding_completed(&state, user.id).await?;
    info!(user_id = %user.id, "user logged in");
    let response = issue_tokens(
        &state,
        PublicUser {
            id: user.id,
            email: user.email,
            onboarding_completed,
        },
    )?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let onboarding_completed = onboarding_completed(&state, user.id).await?;
    let response = issue_tokens(
        &state,
        PublicUser {
            id: user.id,
            email: user.email,
            onboarding_completed,
        },
    )?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let onboarding_completed = onboarding_completed(&state, user.id).await?;
    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
        onboarding_completed,
    }))
}
