//! # survey_api
//!
//! HTTP proxy for the survey kiosk: forwards submissions to the workflow
//! endpoint behind the shared access key or a one-time token, issues
//! one-time tokens and signs static QR links.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{qr, survey, tokens};
use crate::services::tokens::TokenStore;

/// Route paths.
pub mod routes {
    pub const POST_SURVEY_PROXY: &str = "/api/surveyProxy";
    pub const POST_ISSUE_TOKEN: &str = "/api/issueToken";
    pub const GET_QR_REDIRECT: &str = super::handlers::qr::QR_REDIRECT_PATH;
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Proxy configuration.
    pub config: ApiConfig,
    /// Live one-time tokens.
    pub tokens: Arc<TokenStore>,
    /// Client for the workflow endpoint.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            tokens: Arc::new(TokenStore::new()),
            http: reqwest::Client::new(),
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Access key or one-time token
    let submissions = Router::new()
        .route(routes::POST_SURVEY_PROXY, post(survey::survey_proxy_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_credential,
        ));

    // Access key only
    let supporter = Router::new()
        .route(routes::POST_ISSUE_TOKEN, post(tokens::issue_token_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_api_key,
        ));

    // Signing checks the key itself; redemption is public
    let public = Router::new().route(routes::GET_QR_REDIRECT, get(qr::qr_redirect_handler));

    Router::new()
        .merge(submissions)
        .merge(supporter)
        .merge(public)
        .layer(cors)
        .with_state(state)
}

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
