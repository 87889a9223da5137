//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::net::SocketAddr;
use std::sync::Arc;

use auth::{AuthConfig, GoTrueGateway, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
    routing::get,
};
use platform::ProviderSettings;
use platform::config::env_or;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tickets=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Identity provider
    let settings = ProviderSettings::from_env()?;
    let auth_config = Arc::new(AuthConfig::from_env());
    let gateway = identity_provider(&settings, &auth_config)?;

    tracing::info!(provider = %settings.url, "Identity provider configured");

    // CORS configuration
    let origins = allowed_origins(&env_or("FRONTEND_ORIGINS", DEFAULT_FRONTEND_ORIGINS));
    if origins.is_empty() {
        tracing::warn!("FRONTEND_ORIGINS has no valid origin; cross-origin requests will be refused");
    }

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = app(auth_router(gateway, auth_config)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let port = env_or("PORT", &DEFAULT_PORT.to_string())
        .parse::<u16>()
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Server-side calls are anonymous; no session is held, so no auto-refresh task.
fn identity_provider(settings: &ProviderSettings, config: &AuthConfig) -> anyhow::Result<Arc<GoTrueGateway>> {
    Ok(Arc::new(GoTrueGateway::from_settings(settings, config)?))
}

/// Routes served by the binary, before middleware
fn app(auth: Router) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api/auth", auth)
}

/// Comma-separated origin list; entries that are not valid header values are skipped
fn allowed_origins(raw: &str) -> Vec<http::HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| origin.parse().ok())
        .collect()
}
