use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// The two non-health endpoints still consult the access core, but through the
/// non-rejecting principal extractor: an anonymous caller receives a decision
/// (sign-in redirect) rather than a bare rejection.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer
        // checks. Returns "ok" immediately to verify the service is responsive.
        .route("/health", get(|| async { "ok" }))
        // GET /route-decision?path=...
        // Runs the Access Guard for a client-side path. Called by the frontend
        // router once per navigation.
        .route("/route-decision", get(handlers::route_decision))
        // GET /dashboard
        // Post sign-in landing redirect. Resolves the caller's role and 303s to
        // the owning dashboard (or sign-in / role-selection when applicable).
        .route("/dashboard", get(handlers::dashboard_redirect))
}
