//! Member profile endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use super::AppState;
use super::error::{ApiError, ResultExt};
use crate::auth::Auth;
use crate::db::Role;

pub fn router(state: AppState) -> Router {
    Router::new().route("/me", get(me)).with_state(state)
}

#[derive(Serialize)]
struct ProfileResponse {
    uuid: String,
    username: String,
    nickname: String,
    role: Role,
    created_at: String,
}

/// Profile of the authenticated member.
async fn me(
    State(state): State<AppState>,
    Auth(member): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .members()
        .get_by_id(member.member_id)
        .await
        .db_err("Failed to get member")?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    Ok(Json(ProfileResponse {
        uuid: row.uuid,
        username: row.username,
        nickname: row.nickname,
        role: row.role,
        created_at: row.created_at,
    }))
}
