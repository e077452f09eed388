// Library exports for binary tools and tests
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::{OptionStore, PostRepository};
use middleware::auth::JwtSecret;
use services::nonce::NonceIssuer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub options: Arc<dyn OptionStore>,
    pub posts: Arc<dyn PostRepository>,
    pub config: Arc<Config>,
    pub nonces: Arc<NonceIssuer>,
}

impl AppState {
    pub fn new(
        options: Arc<dyn OptionStore>,
        posts: Arc<dyn PostRepository>,
        config: Arc<Config>,
    ) -> Self {
        let nonces = Arc::new(NonceIssuer::new(config.nonce_secret.clone()));
        Self {
            options,
            posts,
            config,
            nonces,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // The site itself and local development may call the API from a browser.
    let site = state.config.site_url.trim_end_matches('/').to_string();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        o == site || o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1")
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Front end
        .route("/breaking-news", get(routes::breaking_news::get_breaking_news))
        .route("/breaking-news/banner", get(routes::breaking_news::get_banner_fragment))
        // Admin
        .route(
            "/admin/settings",
            get(routes::settings::get_settings).post(routes::settings::update_settings),
        )
        .route(
            "/admin/posts/{id}/breaking-news",
            get(routes::metabox::get_metabox).post(routes::metabox::save_metabox),
        )
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
