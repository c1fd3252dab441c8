mod auth;
mod comments;
mod error;
mod members;
mod posts;

use axum::Router;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

/// State shared by all endpoint routers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
}

/// Create the API router. The authentication filter is layered on top by
/// the caller so the route-policy table sees full request paths.
pub fn create_api_router(db: Database, jwt: Arc<JwtConfig>) -> Router {
    let state = AppState {
        tokens: TokenService::new(db.clone(), jwt),
        db,
    };
    let limits = Arc::new(RateLimitConfig::new());

    Router::new()
        .nest("/auth", auth::router(state.clone(), limits))
        .nest("/members", members::router(state.clone()))
        .nest("/posts", posts::router(state.clone()))
        .merge(comments::router(state))
}
