//! Authentication endpoints.
//!
//! - POST `/signup` - create a member
//! - POST `/login` - exchange credentials for a token pair
//! - POST `/reissue` - exchange a refresh token for a new access token
//! - POST `/logout` - revoke the session and blacklist both tokens

use axum::{
    Json, Router, middleware,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use super::error::{ApiError, ResultExt};
use crate::auth::{Auth, AuthError, TokenPair, bearer_token};
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_signup};

const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

const MAX_USERNAME_LENGTH: usize = 32;
const MIN_PASSWORD_LENGTH: usize = 8;

pub fn router(state: AppState, limits: Arc<RateLimitConfig>) -> Router {
    Router::new()
        .route(
            "/signup",
            post(signup).route_layer(middleware::from_fn_with_state(
                limits.clone(),
                rate_limit_signup,
            )),
        )
        .route(
            "/login",
            post(login).route_layer(middleware::from_fn_with_state(limits, rate_limit_login)),
        )
        .route("/reissue", post(reissue))
        .route("/logout", post(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct SignupRequest {
    username: String,
    password: String,
    nickname: String,
}

#[derive(Serialize)]
struct SignupResponse {
    uuid: String,
    username: String,
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.is_empty() || payload.username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::bad_request("Invalid username"));
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request("Password is too short"));
    }
    if payload.nickname.is_empty() {
        return Err(ApiError::bad_request("Nickname is required"));
    }

    let available = state
        .db
        .members()
        .is_username_available(&payload.username)
        .await
        .db_err("Failed to check username")?;
    if !available {
        return Err(ApiError::conflict("Username is already taken"));
    }

    let hash = bcrypt::hash(&payload.password, BCRYPT_COST)
        .map_err(|e| ApiError::db_error("Failed to hash password", e))?;

    let uuid = Uuid::new_v4().to_string();
    state
        .db
        .members()
        .create(&uuid, &payload.username, &hash, &payload.nickname)
        .await
        .db_err("Failed to create member")?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            uuid,
            username: payload.username,
        }),
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let pair = state
        .tokens
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(pair))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReissueResponse {
    access_token: String,
}

/// The refresh token arrives in the same `Authorization: Bearer` header the
/// access token normally uses. The route table marks this endpoint public so
/// the filter does not reject the refresh token as a wrong-kind access
/// token; verification happens in the service.
async fn reissue(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ReissueResponse>, AuthError> {
    let refresh_token = bearer_token(&headers).ok_or(AuthError::InvalidToken)?;
    let access_token = state.tokens.reissue(refresh_token).await?;
    Ok(Json(ReissueResponse { access_token }))
}

async fn logout(
    State(state): State<AppState>,
    Auth(member): Auth,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    // The filter already verified this token; it is present and valid.
    let access_token = bearer_token(&headers).ok_or(AuthError::InvalidToken)?;

    state.tokens.logout(member.member_id, access_token).await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "success": true }))))
}
