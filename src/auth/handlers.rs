use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
        extract::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::AuthError,
    state::AppState,
    store::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() {
        return Err(AuthError::InvalidRequest("username must not be empty".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AuthError::InvalidRequest("invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AuthError::InvalidRequest("password too short".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .store
        .insert(User {
            id: Uuid::new_v4(),
            username: payload.username,
            email: payload.email,
            password_hash,
            created_at: state.clock.now(),
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let username = payload.username.trim();

    // Unknown username and wrong password produce the same response, so the
    // endpoint does not reveal which usernames exist.
    let user = match state.store.find(username).await? {
        Some(u) => u,
        None => {
            warn!("login for unknown username");
            return Err(AuthError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(username = %user.username, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.issue(&user.username, state.clock.now())?;

    info!(username = %user.username, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        expires_in: keys.ttl_secs(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(username): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state
        .store
        .find(&username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    Ok(Json(user.into()))
}
