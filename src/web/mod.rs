mod auth;
mod comments;
mod posts;
pub mod response;
mod routes;
mod upload;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::FromRef;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::TokenKeys;
use crate::config::{AllowedOrigins, Config};
use crate::db::Database;

/// Shared application state.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub keys: Arc<TokenKeys>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, db: Database) -> Self {
        let keys = TokenKeys::new(config.jwt_secret.as_bytes(), config.token_ttl);
        Self {
            db,
            config: Arc::new(config),
            keys: Arc::new(keys),
        }
    }
}

/// Start the web server and run until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(
    config: Config,
    db: Database,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let app = create_app(AppState::new(config, db));

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
pub fn create_app(state: AppState) -> Router {
    let upload_dir = state.config.upload_dir.clone();
    info!(upload_dir = %upload_dir.display(), "Serving uploads");

    Router::new()
        .merge(routes::router(state.config.max_upload_size))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origins {
        // Credentials cannot be combined with a wildcard origin
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(list) => {
            let parsed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer
                .allow_origin(AllowOrigin::list(parsed))
                .allow_credentials(true)
        }
    }
}
