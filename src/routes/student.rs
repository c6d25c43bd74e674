use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Student Router Module
///
/// Defines the routes owned by the `Role::Student` group: browsing open postings,
/// applying, tracking applications, and maintaining the academic profile that
/// backs the eligibility check.
///
/// Access Control Strategy:
/// The student guard layer above this router runs the access core with
/// `access::STUDENT_RULE`, so every handler here executes only for an
/// authenticated student. Identity-dependent handlers additionally extract
/// `AuthUser` for the Owner-Only checks (e.g. withdrawing an application).
pub fn student_routes() -> Router<AppState> {
    Router::new()
        // GET /student/jobs?job_type=...&search=...&min_ctc=...
        // Lists open postings (ACTIVE with a future deadline), with filtering and
        // full-text search. Visibility is enforced unconditionally in the
        // repository query.
        .route("/student/jobs", get(handlers::list_jobs))
        // GET /student/jobs/{id}
        // Retrieves the detail view of a single ACTIVE posting.
        .route("/student/jobs/{id}", get(handlers::get_job_details))
        // POST /student/jobs/{id}/apply
        // Submits an application. Gated on the posting being open, the profile
        // existing, and the eligibility criteria passing; duplicate applications
        // are rejected idempotently via the (job, student) unique pair.
        .route("/student/jobs/{id}/apply", post(handlers::apply_to_job))
        // GET /student/applications
        // Lists the caller's applications enriched with posting details.
        .route("/student/applications", get(handlers::my_applications))
        // PATCH /student/applications/{id}/withdraw
        // Withdraws a non-terminal application. Ownership enforced in the
        // repository predicate.
        .route(
            "/student/applications/{id}/withdraw",
            patch(handlers::withdraw_application),
        )
        // GET/PUT /student/profile
        // Reads and upserts the caller's academic profile (branch, CGPA,
        // graduation year, backlogs).
        .route(
            "/student/profile",
            get(handlers::get_student_profile).put(handlers::upsert_student_profile),
        )
        // POST /student/resume/presigned
        // Initiates the secure resume upload pipeline: a short-lived presigned S3
        // URL lets the client upload the PDF directly to storage, bypassing the
        // application server.
        .route(
            "/student/resume/presigned",
            post(handlers::get_resume_presigned),
        )
}
