use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post, put},
};

/// Recruiter Router Module
///
/// Defines the routes owned by the `Role::Recruiter` group: posting jobs (into the
/// TPO approval queue), managing own postings, and reviewing applicants.
///
/// Access Control Strategy:
/// The recruiter guard layer runs the access core with `access::RECRUITER_RULE`.
/// Every mutating handler additionally enforces an **Owner-Only** check against
/// the `recruiter_id` resolved by the `AuthUser` extractor, and `create_job`
/// requires a TPO-approved account.
pub fn recruiter_routes() -> Router<AppState> {
    Router::new()
        // POST /recruiter/jobs
        // Submits a new posting. Requires an approved recruiter account; the
        // posting starts in PENDING_APPROVAL and is invisible to students until
        // the TPO approves it.
        // GET /recruiter/jobs
        // Lists the caller's own postings in every status, including rejected
        // ones with their rejection reason.
        .route(
            "/recruiter/jobs",
            post(handlers::create_job).get(handlers::my_jobs),
        )
        // PUT/DELETE /recruiter/jobs/{id}
        // Modifies or removes one of the caller's own postings. The ownership
        // check lives in the repository predicate: a non-owner request affects 0
        // rows and answers 404.
        .route(
            "/recruiter/jobs/{id}",
            put(handlers::update_job).delete(handlers::delete_job),
        )
        // PATCH /recruiter/jobs/{id}/close
        // Ends the application window of an ACTIVE posting early. Owner-only and
        // one-way; the posting keeps its application history.
        .route("/recruiter/jobs/{id}/close", patch(handlers::close_job))
        // GET /recruiter/jobs/{id}/applications
        // Lists applicants for one of the caller's own postings, enriched with
        // each student's identity.
        .route(
            "/recruiter/jobs/{id}/applications",
            get(handlers::job_applicants),
        )
        // PATCH /recruiter/applications/{id}/status
        // Review transition: SHORTLISTED, SELECTED, or REJECTED. Withdrawn
        // applications are immutable.
        .route(
            "/recruiter/applications/{id}/status",
            patch(handlers::review_application),
        )
}
