use axum::{
    extract::{FromRef, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest,
            UpdateProfileRequest,
        },
        repo::User,
        services::{hash_password, is_valid_email, verify_password, AuthUser, JwtKeys},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/me", put(update_me))
}

fn token_pair(keys: &JwtKeys, user_id: uuid::Uuid) -> Result<(String, String), ApiError> {
    let access_token = keys.sign_access(user_id)?;
    let refresh_token = keys.sign_refresh(user_id)?;
    Ok((access_token, refresh_token))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::validation("Password too short"));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, payload.name.trim(), &payload.email, &hash).await?;

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized("Invalid credentials".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let (access_token, refresh_token) = token_pair(&keys, user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    let user = User::update_name(&state.db, user_id, payload.name.trim()).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}

#[cfg(test)]
mod me_tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn test_me_response_serialization() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            name: "Test Buyer".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            is_admin: false,
            stripe_customer_id: None,
            created_at: OffsetDateTime::now_utc(),
        };

        let public: PublicUser = user.into();
        let json = serde_json::to_string(&public).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("Test Buyer"));
        assert!(!json.contains("secret-hash"));
    }
}
