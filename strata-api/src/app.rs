/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use strata_api::{app::{build_router, AppState}, config::Config};
/// use strata_shared::{services::Services, store::MemoryStore};
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let services = Services::new(
///     Arc::new(MemoryStore::new()),
///     config.jwt.secret.clone(),
///     config.password.into(),
/// );
/// let app = build_router(AppState::new(services, config));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::{sync::Arc, time::Duration};
use strata_shared::services::Services;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Component services over the configured store
    pub services: Services,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(services: Services, config: Config) -> Self {
        Self {
            services,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health                      (public)
/// ├── GET  /health/ready                (public)
/// ├── POST /auth/register|login|refresh (public)
/// ├── /projects                         GET, POST
/// │   └── /:project_id/members          GET, POST
/// ├── /contents
/// │   ├── /project/:project_id          GET, POST
/// │   └── /:content_id                  GET
/// ├── /versions/content/:content_id     GET, POST
/// ├── /tags                             GET, POST
/// │   ├── /content/:content_id          GET, POST
/// │   └── /:tag_id/contents             GET
/// └── GET /search?q=
/// ```
///
/// Everything outside `/health` and `/auth` requires a bearer access token.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/health/ready", get(routes::health::readiness))
        .nest("/auth", routes::auth::router());

    let protected_routes = Router::new()
        .nest("/projects", routes::projects::router())
        .nest("/contents", routes::contents::router())
        .nest("/versions", routes::versions::router())
        .nest("/tags", routes::tags::router())
        .route("/search", get(routes::search::search))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
