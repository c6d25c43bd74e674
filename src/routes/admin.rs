use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the `Role::Admin` role
/// (the TPO): moderation of postings, account approvals, role reassignment, and
/// placement analytics.
///
/// Access Control:
/// This entire router is wrapped in the admin guard layer (access core with
/// `access::ADMIN_RULE`). On top of that, every handler re-checks the Admin role
/// from its own resolved `AuthUser` before touching the repository, so a wiring
/// mistake in the router cannot expose a moderation endpoint.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Core placement metrics (students, recruiters, active postings, pending
        // approvals, applications, selections) for the TPO dashboard.
        .route("/admin/stats", get(handlers::get_admin_stats))
        // GET /admin/jobs
        // Lists ALL postings regardless of status or owner, pending approvals
        // first. This is the moderation queue.
        .route("/admin/jobs", get(handlers::get_admin_jobs))
        // POST /admin/jobs/{id}/approve
        // Publishes a pending posting (status -> ACTIVE), making it visible to
        // eligible students.
        .route("/admin/jobs/{id}/approve", post(handlers::approve_job))
        // POST /admin/jobs/{id}/reject
        // Rejects a posting with a reason the recruiter can read.
        .route("/admin/jobs/{id}/reject", post(handlers::reject_job))
        // GET /admin/users?role=...
        // Lists registered accounts, optionally filtered by role.
        .route("/admin/users", get(handlers::get_admin_users))
        // POST /admin/users/{id}/approve
        // TPO account approval. Recruiters must be approved before posting.
        .route("/admin/users/{id}/approve", post(handlers::approve_user))
        // PATCH /admin/users/{id}/role
        // The explicit role reassignment path; the only way an existing role
        // changes, and the only way ADMIN is granted.
        .route("/admin/users/{id}/role", patch(handlers::update_user_role))
}
