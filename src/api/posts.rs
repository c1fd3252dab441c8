//! Post endpoints: CRUD, offset pagination, and title search.
//!
//! Listing and reading are public per the route table; everything mutating
//! requires an authenticated member, and only the author or an admin may
//! update or delete.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::{ApiError, ResultExt};
use crate::auth::Auth;
use crate::db::{Post, Role};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const MAX_TITLE_LENGTH: usize = 200;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_posts))
        .route("/", post(create_post))
        .route("/{uuid}", get(get_post))
        .route("/{uuid}", put(update_post))
        .route("/{uuid}", delete(delete_post))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    page: i64,
    size: Option<i64>,
    query: Option<String>,
}

#[derive(Serialize)]
struct PostSummaryResponse {
    uuid: String,
    author: String,
    title: String,
    created_at: String,
    updated_at: String,
}

#[derive(Serialize)]
struct PostPageResponse {
    posts: Vec<PostSummaryResponse>,
    total: i64,
    page: i64,
    size: i64,
}

#[derive(Serialize)]
struct PostResponse {
    uuid: String,
    author: String,
    title: String,
    content: String,
    created_at: String,
    updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            uuid: p.uuid,
            author: p.author,
            title: p.title,
            content: p.content,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct WritePostRequest {
    title: String,
    #[serde(default)]
    content: String,
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ApiError::bad_request("Title is too long"));
    }
    Ok(())
}

// --- Handlers ---

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.page.max(0);
    let size = params
        .size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let query = params.query.as_deref().filter(|q| !q.is_empty());

    let result = state
        .db
        .posts()
        .list(page, size, query)
        .await
        .db_err("Failed to list posts")?;

    Ok(Json(PostPageResponse {
        posts: result
            .posts
            .into_iter()
            .map(|p| PostSummaryResponse {
                uuid: p.uuid,
                author: p.author,
                title: p.title,
                created_at: p.created_at,
                updated_at: p.updated_at,
            })
            .collect(),
        total: result.total,
        page: result.page,
        size: result.size,
    }))
}

async fn get_post(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(PostResponse::from(post)))
}

async fn create_post(
    State(state): State<AppState>,
    Auth(member): Auth,
    Json(payload): Json<WritePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_title(&payload.title)?;

    let uuid = state
        .db
        .posts()
        .create(member.member_id, &payload.title, &payload.content)
        .await
        .db_err("Failed to create post")?;

    let post = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::internal("Post vanished after insert"))?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

async fn update_post(
    State(state): State<AppState>,
    Auth(member): Auth,
    Path(uuid): Path<String>,
    Json(payload): Json<WritePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    validate_title(&payload.title)?;

    let post = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if post.member_id != member.member_id && member.role != Role::Admin {
        return Err(ApiError::forbidden("Only the author can edit this post"));
    }

    state
        .db
        .posts()
        .update(&uuid, &payload.title, &payload.content)
        .await
        .db_err("Failed to update post")?;

    let updated = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(PostResponse::from(updated)))
}

async fn delete_post(
    State(state): State<AppState>,
    Auth(member): Auth,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .db
        .posts()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if post.member_id != member.member_id && member.role != Role::Admin {
        return Err(ApiError::forbidden("Only the author can delete this post"));
    }

    state
        .db
        .posts()
        .delete(&uuid)
        .await
        .db_err("Failed to delete post")?;

    Ok(StatusCode::NO_CONTENT)
}
