//! Comment endpoints: create, list per post, nested replies, delete.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::{ApiError, ResultExt};
use crate::auth::Auth;
use crate::db::{Comment, Role};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/posts/{uuid}/comments", get(list_comments))
        .route("/posts/{uuid}/comments", post(create_comment))
        .route("/comments/{uuid}", delete(delete_comment))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommentRequest {
    content: String,
    parent_uuid: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentResponse {
    uuid: String,
    author: String,
    parent_uuid: Option<String>,
    content: String,
    created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            uuid: c.uuid,
            author: c.author,
            parent_uuid: c.parent_uuid,
            content: c.content,
            created_at: c.created_at,
        }
    }
}

async fn list_comments(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let comments = state
        .db
        .comments()
        .list_by_post(post.id)
        .await
        .db_err("Failed to list comments")?;

    let response: Vec<CommentResponse> = comments.into_iter().map(CommentResponse::from).collect();
    Ok(Json(response))
}

async fn create_comment(
    State(state): State<AppState>,
    Auth(member): Auth,
    Path(uuid): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::bad_request("Comment content is required"));
    }

    let post = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    // A reply must target a comment on the same post.
    let parent_id = match &payload.parent_uuid {
        Some(parent_uuid) => {
            let parent = state
                .db
                .comments()
                .get_by_uuid(parent_uuid)
                .await
                .db_err("Failed to get parent comment")?
                .ok_or_else(|| ApiError::not_found("Parent comment not found"))?;
            if parent.post_id != post.id {
                return Err(ApiError::bad_request("Parent comment is on another post"));
            }
            Some(parent.id)
        }
        None => None,
    };

    let comment_uuid = state
        .db
        .comments()
        .create(post.id, member.member_id, parent_id, &payload.content)
        .await
        .db_err("Failed to create comment")?;

    let comment = state
        .db
        .comments()
        .get_by_uuid(&comment_uuid)
        .await
        .db_err("Failed to get comment")?
        .ok_or_else(|| ApiError::internal("Comment vanished after insert"))?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

async fn delete_comment(
    State(state): State<AppState>,
    Auth(member): Auth,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .db
        .comments()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get comment")?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.member_id != member.member_id && member.role != Role::Admin {
        return Err(ApiError::forbidden("Only the author can delete this comment"));
    }

    state
        .db
        .comments()
        .delete(&uuid)
        .await
        .db_err("Failed to delete comment")?;

    Ok(StatusCode::NO_CONTENT)
}
