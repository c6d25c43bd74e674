use crate::{
    AppState,
    access::{self, Decision, Role},
    auth::{AuthUser, CurrentPrincipal},
    config::AppConfig,
    models::{
        self, AdminDashboardStats, ApplicantResponse, Application, ApplicationResponse,
        ApplyRequest, CreateJobRequest, JobPosting, PresignedUrlRequest, PresignedUrlResponse,
        RejectJobRequest, RouteDecisionResponse, SelectRoleRequest, StudentProfile,
        UpdateApplicationStatusRequest, UpdateJobRequest, UpdateUserRoleRequest,
        UpsertStudentProfileRequest, User, UserProfile, application_status, job_status,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// JobFilter
///
/// Accepted query parameters for the student job listing (GET /student/jobs).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct JobFilter {
    /// Optional filter on the job type ('Full-time', 'Internship', ...).
    pub job_type: Option<String>,
    /// Optional full-text search string across title/description/company.
    pub search: Option<String>,
    /// Optional minimum package filter in LPA.
    pub min_ctc: Option<f64>,
}

/// UserFilter
///
/// Accepted query parameters for the admin user listing (GET /admin/users).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserFilter {
    /// Optional canonical role token to filter by.
    pub role: Option<String>,
}

/// RouteDecisionQuery
///
/// Query parameters for the route-decision endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct RouteDecisionQuery {
    /// The client-side path about to be navigated to.
    pub path: String,
}

// --- Access Core Endpoints ---

/// route_decision
///
/// [Public Route] Runs the Access Guard for an arbitrary client path. The router
/// collaborator calls this once per navigation; the response carries the decision
/// and, for the redirecting variants, the target path. Paths that match no rule
/// are public and always `ALLOW`.
#[utoipa::path(
    get,
    path = "/route-decision",
    params(RouteDecisionQuery),
    responses((status = 200, description = "Guard decision", body = RouteDecisionResponse))
)]
pub async fn route_decision(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Query(query): Query<RouteDecisionQuery>,
) -> Json<RouteDecisionResponse> {
    let Some(rule) = access::rule_for(&query.path) else {
        return Json(RouteDecisionResponse {
            decision: "ALLOW".to_string(),
            redirect: None,
        });
    };

    let session = access::resolve_session(&principal);
    let role = access::resolve_role(&principal, &state.config.env);

    let response = match access::decide(session, role, rule) {
        // Hold: the provider has not finished loading; the client re-evaluates on
        // its next state change event.
        None => RouteDecisionResponse {
            decision: "HOLD".to_string(),
            redirect: None,
        },
        Some(Decision::Allow) => RouteDecisionResponse {
            decision: "ALLOW".to_string(),
            redirect: None,
        },
        Some(decision) => {
            let name = match decision {
                Decision::RedirectToSignIn => "SIGN_IN",
                Decision::RedirectToRoleSelection => "ROLE_SELECTION",
                _ => "DASHBOARD",
            };
            RouteDecisionResponse {
                decision: name.to_string(),
                redirect: access::redirect_target(decision).map(str::to_string),
            }
        }
    };
    Json(response)
}

/// dashboard_redirect
///
/// [Public Route] Post sign-in landing: 303-redirects the caller to the dashboard
/// owned by their resolved role. Unauthenticated callers land on sign-in, role-less
/// callers on role selection. Both targets come from the access core so the mapping
/// lives in exactly one place.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 303, description = "Redirect to the caller's landing page"))
)]
pub async fn dashboard_redirect(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let session = access::resolve_session(&principal);
    let role = access::resolve_role(&principal, &state.config.env);

    match access::decide(session, role, &access::DASHBOARD_RULE) {
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        Some(Decision::Allow) => Redirect::to(access::dashboard_path(role)).into_response(),
        Some(decision) => {
            let target = access::redirect_target(decision).unwrap_or(access::ROOT_PATH);
            Redirect::to(target).into_response()
        }
    }
}

// --- Session / Role Endpoints ---

/// get_me
///
/// [Authenticated Route] Provides the authenticated user's profile information.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, StatusCode> {
    // The user existed a moment ago in the extractor; a miss here means the account
    // was deleted mid-flight.
    let user = state.repo.get_user(id).await.ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
        is_approved: user.is_approved,
    }))
}

/// select_role
///
/// [Authenticated Route] Role-selection write-back, completing onboarding.
///
/// *Policy*: Only STUDENT and RECRUITER are self-assignable. A role, once set, is
/// immutable through this endpoint (409); reassignment goes through the admin
/// endpoint. On success the new role is synced to the auth provider's metadata
/// fire-and-forget.
#[utoipa::path(
    post,
    path = "/auth/role",
    request_body = SelectRoleRequest,
    responses(
        (status = 200, description = "Role set", body = UserProfile),
        (status = 400, description = "Invalid role"),
        (status = 409, description = "Role already set")
    )
)]
pub async fn select_role(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SelectRoleRequest>,
) -> Result<Json<UserProfile>, StatusCode> {
    let role = match Role::parse(&payload.role) {
        Some(Role::Student) => Role::Student,
        Some(Role::Recruiter) => Role::Recruiter,
        // ADMIN is never self-assignable; unknown tokens fail the same way.
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    let user = state.repo.get_user(id).await.ok_or(StatusCode::UNAUTHORIZED)?;
    if user.role.is_some() {
        return Err(StatusCode::CONFLICT);
    }

    let updated = state
        .repo
        .set_user_role(id, role.as_str())
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    sync_role_metadata(state.config.clone(), id, role);

    Ok(Json(UserProfile {
        id: updated.id,
        email: updated.email,
        full_name: updated.full_name,
        role: updated.role,
        is_approved: updated.is_approved,
    }))
}

/// sync_role_metadata
///
/// Pushes the chosen role into the auth provider's user metadata so future tokens
/// carry it. Fire-and-forget: the portal's own record is already authoritative, so
/// a sync failure is logged and never surfaced to the caller.
fn sync_role_metadata(config: AppConfig, user_id: Uuid, role: Role) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let url = format!("{}/v1/users/{}/metadata", config.auth_api_url, user_id);

        let result = client
            .patch(url)
            .bearer_auth(&config.auth_api_key)
            .json(&serde_json::json!({ "public_metadata": { "role": role.as_str() } }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(
                    "role metadata sync rejected for {}: {}",
                    user_id,
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("role metadata sync failed for {}: {}", user_id, e);
            }
        }
    });
}

// --- Student Handlers ---

/// list_jobs
///
/// [Student Route] Lists open postings with filtering and search.
///
/// *Visibility*: the repository enforces `status = ACTIVE` and a future deadline
/// unconditionally; filters only narrow the result.
#[utoipa::path(
    get,
    path = "/student/jobs",
    params(JobFilter),
    responses((status = 200, description = "Open postings", body = [JobPosting]))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Json<Vec<models::JobPosting>> {
    let jobs = state
        .repo
        .list_active_jobs(filter.job_type, filter.search, filter.min_ctc)
        .await;
    Json(jobs)
}

/// get_job_details
///
/// [Student Route] Retrieves a single posting. Only ACTIVE postings are visible to
/// students; pending and rejected postings do not exist from their perspective.
#[utoipa::path(
    get,
    path = "/student/jobs/{id}",
    params(("id" = Uuid, Path, description = "Posting ID")),
    responses((status = 200, description = "Found", body = JobPosting))
)]
pub async fn get_job_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::JobPosting>, StatusCode> {
    match state.repo.get_job(id).await {
        Some(job) if job.status == job_status::ACTIVE => Ok(Json(job)),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

/// apply_to_job
///
/// [Student Route] Submits an application to a posting.
///
/// *Gates*, in order: the posting must exist and be open (410 once the deadline
/// passes or the posting closes), the student must have an academic profile, and
/// the profile must pass the posting's eligibility criteria (422 with the first
/// failing reason). Duplicate applications are rejected idempotently (409).
#[utoipa::path(
    post,
    path = "/student/jobs/{id}/apply",
    params(("id" = Uuid, Path, description = "Posting ID")),
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Applied", body = Application),
        (status = 404, description = "Unknown posting"),
        (status = 409, description = "Already applied"),
        (status = 410, description = "Applications closed"),
        (status = 422, description = "Not eligible")
    )
)]
pub async fn apply_to_job(
    AuthUser { id: student_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<ApplyRequest>,
) -> impl IntoResponse {
    let Some(job) = state.repo.get_job(job_id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match job.status.as_str() {
        job_status::ACTIVE => {}
        // A closed posting was once visible, so it is gone rather than unknown.
        job_status::CLOSED => return StatusCode::GONE.into_response(),
        // Pending and rejected postings never existed from a student's view.
        _ => return StatusCode::NOT_FOUND.into_response(),
    }
    if !job.is_open(Utc::now()) {
        return StatusCode::GONE.into_response();
    }

    let Some(profile) = state.repo.get_student_profile(student_id).await else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Please complete your profile before applying",
        )
            .into_response();
    };

    if let Err(reason) = job.check_eligibility(&profile) {
        return (StatusCode::UNPROCESSABLE_ENTITY, reason).into_response();
    }

    match state
        .repo
        .create_application(job_id, student_id, payload.cover_note)
        .await
    {
        Some(application) => (StatusCode::CREATED, Json(application)).into_response(),
        None => StatusCode::CONFLICT.into_response(),
    }
}

/// my_applications
///
/// [Student Route] Lists the caller's applications enriched with posting details.
#[utoipa::path(
    get,
    path = "/student/applications",
    responses((status = 200, description = "My applications", body = [ApplicationResponse]))
)]
pub async fn my_applications(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::ApplicationResponse>> {
    let applications = state.repo.list_applications_by_student(id).await;
    Json(applications)
}

/// withdraw_application
///
/// [Student Route] Withdraws one of the caller's own applications.
///
/// *Ownership*: the repository enforces the owner check and only transitions
/// non-terminal applications; anything else answers 404.
#[utoipa::path(
    patch,
    path = "/student/applications/{id}/withdraw",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Withdrawn"),
        (status = 404, description = "Not Found, Not Yours, or Already Decided")
    )
)]
pub async fn withdraw_application(
    AuthUser { id: student_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.repo.withdraw_application(id, student_id).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// get_student_profile
///
/// [Student Route] Retrieves the caller's academic profile.
#[utoipa::path(
    get,
    path = "/student/profile",
    responses((status = 200, description = "Profile", body = StudentProfile))
)]
pub async fn get_student_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<models::StudentProfile>, StatusCode> {
    match state.repo.get_student_profile(id).await {
        Some(profile) => Ok(Json(profile)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// upsert_student_profile
///
/// [Student Route] Creates or replaces the caller's academic profile. The resume
/// key set by the upload pipeline survives profile edits.
#[utoipa::path(
    put,
    path = "/student/profile",
    request_body = UpsertStudentProfileRequest,
    responses((status = 200, description = "Saved", body = StudentProfile))
)]
pub async fn upsert_student_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpsertStudentProfileRequest>,
) -> Json<models::StudentProfile> {
    let profile = state.repo.upsert_student_profile(id, payload).await;
    Json(profile)
}

/// get_resume_presigned
///
/// [Student Route] Generates a temporary, secure URL for direct client-to-cloud
/// resume upload, and records the reserved object key on the caller's profile.
///
/// The URL is short-lived (10 minutes), constrained to the declared `file_type`,
/// and keyed under the caller's ID with a fresh UUID.
#[utoipa::path(
    post,
    path = "/student/resume/presigned",
    request_body = PresignedUrlRequest,
    responses((status = 200, description = "URL", body = PresignedUrlResponse))
)]
pub async fn get_resume_presigned(
    AuthUser { id: student_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> impl IntoResponse {
    // Unique, structured object key: 'resumes/<user>/<uuid>.<ext>'.
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("pdf");
    let unique_id = Uuid::new_v4();
    let object_key = format!("resumes/{}/{}.{}", student_id, unique_id, extension);

    match state
        .storage
        .presign_upload(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => {
            // The key is reserved up front so the profile points at the incoming
            // upload; a failed client upload simply leaves a dangling key.
            state.repo.set_resume_key(student_id, &object_key).await;
            let response = PresignedUrlResponse {
                upload_url: url,
                resource_key: object_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("storage error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
        }
    }
}

// --- Recruiter Handlers ---

/// create_job
///
/// [Recruiter Route] Submits a new posting. All new postings start in
/// `PENDING_APPROVAL` and require TPO moderation before students can see them.
///
/// *Approval gate*: an unapproved recruiter account cannot post (403).
#[utoipa::path(
    post,
    path = "/recruiter/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Created, pending approval", body = JobPosting),
        (status = 403, description = "Account pending approval")
    )
)]
pub async fn create_job(
    AuthUser {
        id, is_approved, ..
    }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<models::CreateJobRequest>,
) -> impl IntoResponse {
    if !is_approved {
        return StatusCode::FORBIDDEN.into_response();
    }
    let job = state.repo.create_job(payload, id).await;
    (StatusCode::CREATED, Json(job)).into_response()
}

/// my_jobs
///
/// [Recruiter Route] Lists the caller's own postings, any status.
#[utoipa::path(
    get,
    path = "/recruiter/jobs",
    responses((status = 200, description = "My postings", body = [JobPosting]))
)]
pub async fn my_jobs(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::JobPosting>> {
    let jobs = state.repo.list_jobs_by_recruiter(id).await;
    Json(jobs)
}

/// update_job
///
/// [Recruiter Route] Partially updates one of the caller's own postings.
///
/// *Authorization*: the repository enforces the **Owner-Only** check; a non-owner
/// update affects 0 rows and answers 404.
#[utoipa::path(
    put,
    path = "/recruiter/jobs/{id}",
    params(("id" = Uuid, Path, description = "Posting ID")),
    request_body = UpdateJobRequest,
    responses((status = 200, description = "Updated", body = JobPosting))
)]
pub async fn update_job(
    AuthUser { id: recruiter_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<models::JobPosting>, StatusCode> {
    match state.repo.update_job(id, recruiter_id, payload).await {
        Some(job) => Ok(Json(job)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_job
///
/// [Recruiter Route] Deletes one of the caller's own postings.
#[utoipa::path(
    delete,
    path = "/recruiter/jobs/{id}",
    params(("id" = Uuid, Path, description = "Posting ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found or Not Owner")
    )
)]
pub async fn delete_job(
    AuthUser { id: recruiter_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.repo.delete_job(id, recruiter_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// close_job
///
/// [Recruiter Route] Closes one of the caller's own ACTIVE postings, ending the
/// application window early. Closed postings vanish from the student listing but
/// stay visible to the recruiter and admin with their application history.
#[utoipa::path(
    patch,
    path = "/recruiter/jobs/{id}/close",
    params(("id" = Uuid, Path, description = "Posting ID")),
    responses(
        (status = 200, description = "Closed", body = JobPosting),
        (status = 404, description = "Not Found, Not Owner, or Not Active")
    )
)]
pub async fn close_job(
    AuthUser { id: recruiter_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::JobPosting>, StatusCode> {
    match state.repo.close_job(id, recruiter_id).await {
        Some(job) => Ok(Json(job)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// job_applicants
///
/// [Recruiter Route] Lists applicants for one of the caller's own postings.
///
/// *Authorization*: ownership is verified before any applicant data is read; a
/// foreign posting answers 404 rather than 403 to avoid leaking its existence.
#[utoipa::path(
    get,
    path = "/recruiter/jobs/{id}/applications",
    params(("id" = Uuid, Path, description = "Posting ID")),
    responses((status = 200, description = "Applicants", body = [ApplicantResponse]))
)]
pub async fn job_applicants(
    AuthUser { id: recruiter_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<models::ApplicantResponse>>, StatusCode> {
    let job = state.repo.get_job(id).await.ok_or(StatusCode::NOT_FOUND)?;
    if job.recruiter_id != recruiter_id {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(state.repo.list_applicants_for_job(id).await))
}

/// review_application
///
/// [Recruiter Route] Moves an application through the review pipeline
/// (SHORTLISTED, SELECTED, REJECTED).
///
/// *Authorization*: the application must target one of the caller's own postings.
/// *Lifecycle*: withdrawn applications are immutable (409).
#[utoipa::path(
    patch,
    path = "/recruiter/applications/{id}/status",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateApplicationStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Application),
        (status = 400, description = "Invalid target status"),
        (status = 409, description = "Application withdrawn")
    )
)]
pub async fn review_application(
    AuthUser { id: recruiter_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationStatusRequest>,
) -> Result<Json<models::Application>, StatusCode> {
    let allowed = [
        application_status::SHORTLISTED,
        application_status::SELECTED,
        application_status::REJECTED,
    ];
    if !allowed.contains(&payload.status.as_str()) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let application = state
        .repo
        .get_application(id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    if application.status == application_status::WITHDRAWN {
        return Err(StatusCode::CONFLICT);
    }

    let job = state
        .repo
        .get_job(application.job_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    if job.recruiter_id != recruiter_id {
        return Err(StatusCode::NOT_FOUND);
    }

    state
        .repo
        .set_application_status(id, &payload.status)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

// --- Admin Handlers ---

/// get_admin_stats
///
/// [Admin Route] Retrieves core placement statistics for the TPO dashboard.
///
/// *Authorization*: explicitly re-checks the Admin role inside the handler, on top
/// of the admin guard layer.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, StatusCode> {
    if role != Some(Role::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_stats().await))
}

/// get_admin_jobs
///
/// [Admin Route] Retrieves ALL postings regardless of status or owner, pending
/// approvals first. This is the TPO moderation queue.
#[utoipa::path(
    get,
    path = "/admin/jobs",
    responses((status = 200, description = "All postings", body = [JobPosting]))
)]
pub async fn get_admin_jobs(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<models::JobPosting>>, StatusCode> {
    if role != Some(Role::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.list_all_jobs().await))
}

/// approve_job
///
/// [Admin Route] Publishes a pending posting, making it visible to students.
#[utoipa::path(
    post,
    path = "/admin/jobs/{id}/approve",
    params(("id" = Uuid, Path, description = "Posting ID")),
    responses((status = 200, description = "Approved", body = JobPosting))
)]
pub async fn approve_job(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::JobPosting>, StatusCode> {
    if role != Some(Role::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.set_job_status(id, job_status::ACTIVE, None).await {
        Some(job) => Ok(Json(job)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// reject_job
///
/// [Admin Route] Rejects a posting with a reason the recruiter can read.
#[utoipa::path(
    post,
    path = "/admin/jobs/{id}/reject",
    params(("id" = Uuid, Path, description = "Posting ID")),
    request_body = RejectJobRequest,
    responses((status = 200, description = "Rejected", body = JobPosting))
)]
pub async fn reject_job(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectJobRequest>,
) -> Result<Json<models::JobPosting>, StatusCode> {
    if role != Some(Role::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state
        .repo
        .set_job_status(id, job_status::REJECTED, Some(payload.reason))
        .await
    {
        Some(job) => Ok(Json(job)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_admin_users
///
/// [Admin Route] Lists registered users, optionally filtered by role.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserFilter),
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn get_admin_users(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<models::User>>, StatusCode> {
    if role != Some(Role::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.list_users(filter.role).await))
}

/// approve_user
///
/// [Admin Route] Marks an account as TPO-approved. Recruiters need this before
/// they can post jobs.
#[utoipa::path(
    post,
    path = "/admin/users/{id}/approve",
    params(("id" = Uuid, Path, description = "User ID")),
    responses((status = 200, description = "Approved", body = User))
)]
pub async fn approve_user(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::User>, StatusCode> {
    if role != Some(Role::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.approve_user(id).await {
        Some(user) => Ok(Json(user)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// update_user_role
///
/// [Admin Route] The explicit reassignment path for roles. Unlike self-selection,
/// any of the three canonical roles may be assigned, and an existing role may be
/// overwritten. The change is synced to the auth provider's metadata.
#[utoipa::path(
    patch,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRoleRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Invalid role")
    )
)]
pub async fn update_user_role(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRoleRequest>,
) -> Result<Json<models::User>, StatusCode> {
    if role != Some(Role::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    let new_role = Role::parse(&payload.role).ok_or(StatusCode::BAD_REQUEST)?;

    let updated = state
        .repo
        .set_user_role(id, new_role.as_str())
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    sync_role_metadata(state.config.clone(), id, new_role);

    Ok(Json(updated))
}
