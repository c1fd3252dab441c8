pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::create_api_router;
use auth::{AuthState, authenticate};
use axum::{Router, middleware};
use db::Database;
use jwt::JwtConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(
        &config.jwt_secret,
        config.access_ttl,
        config.refresh_ttl,
    ));

    let auth_state = AuthState {
        db: config.db.clone(),
        jwt: jwt.clone(),
    };

    // The filter wraps the whole API; the route-policy table decides which
    // requests pass through unauthenticated.
    create_api_router(config.db.clone(), jwt)
        .layer(middleware::from_fn_with_state(auth_state, authenticate))
}

/// Run cleanup tasks and spawn the background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(config: &ServerConfig) {
    cleanup::run_cleanup(&config.db, config.refresh_ttl).await;
    cleanup::spawn_cleanup_scheduler(config.db.clone(), config.refresh_ttl);
}

/// Run the server on the given listener. This function blocks until the
/// server exits. Call `init_cleanup` before this to sweep on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
