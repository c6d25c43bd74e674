use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Auth Router Module
///
/// Session-facing endpoints under `/auth`, open to **any authenticated
/// principal**, including users who have not picked a role yet, since role
/// selection itself lives here. The session guard layer wraps this router;
/// the role-evaluating guards apply only to the role-owned groups.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // GET /auth/me
        // Retrieves the currently authenticated user's profile and approval state.
        .route("/auth/me", get(handlers::get_me))
        // POST /auth/role
        // Role-selection write-back completing onboarding. STUDENT or RECRUITER
        // only; rejects with 409 once a role is set (reassignment is an explicit
        // admin action under /admin/users/{id}/role).
        .route("/auth/role", post(handlers::select_role))
}
