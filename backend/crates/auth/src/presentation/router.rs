//! Auth Router

use axum::{Router, routing::post};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::gateway::AuthGateway;
use crate::infra::gotrue::GoTrueGateway;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router backed by the hosted identity provider
pub fn auth_router(gateway: Arc<GoTrueGateway>, config: Arc<AuthConfig>) -> Router {
    auth_router_generic(gateway, config)
}

/// Create a generic Auth router for any gateway implementation
pub fn auth_router_generic<G>(gateway: Arc<G>, config: Arc<AuthConfig>) -> Router
where
    G: AuthGateway + Send + Sync + 'static,
{
    let state = AuthAppState { gateway, config };

    Router::new()
        .route(
            "/resend-verification",
            post(handlers::resend_verification::<G>),
        )
        .with_state(state)
}
