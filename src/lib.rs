use axum::{
    Json, Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// The role-resolution and access-control core (pure decision functions).
pub mod access;

pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Role-segregated routers: public, auth, student, recruiter, admin.
pub mod routes;
use routes::{admin, auth as auth_routes, public, recruiter, student};

use access::{Decision, Principal, RouteRule, SessionStatus};
use auth::CurrentPrincipal;
use config::Env;

// Re-exported so main.rs and the integration tests build state without reaching
// into submodules.
pub use config::AppConfig;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregate OpenAPI document: every `#[utoipa::path]` handler and every
/// `ToSchema` payload is registered here, and the generated JSON is served at
/// `/api-docs/openapi.json` behind the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::route_decision, handlers::dashboard_redirect, handlers::get_me,
        handlers::select_role, handlers::list_jobs, handlers::get_job_details,
        handlers::apply_to_job, handlers::my_applications, handlers::withdraw_application,
        handlers::get_student_profile, handlers::upsert_student_profile,
        handlers::get_resume_presigned, handlers::create_job, handlers::my_jobs,
        handlers::update_job, handlers::delete_job, handlers::close_job,
        handlers::job_applicants,
        handlers::review_application, handlers::get_admin_stats, handlers::get_admin_jobs,
        handlers::approve_job, handlers::reject_job, handlers::get_admin_users,
        handlers::approve_user, handlers::update_user_role
    ),
    components(
        schemas(
            models::User, models::StudentProfile, models::JobPosting, models::Application,
            models::SelectRoleRequest, models::UpdateUserRoleRequest, models::CreateJobRequest,
            models::UpdateJobRequest, models::ApplyRequest,
            models::UpdateApplicationStatusRequest, models::RejectJobRequest,
            models::UpsertStudentProfileRequest, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::UserProfile, models::ApplicationResponse,
            models::ApplicantResponse, models::AdminDashboardStats, models::RedirectBody,
            models::RouteDecisionResponse, access::Role,
        )
    ),
    tags(
        (name = "placeme", description = "PlaceMe Placement Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The one shared, immutable container every request sees: persistence and storage
/// behind trait objects, plus the loaded configuration. Cloning is cheap (two Arcs
/// and a small struct), which is what axum's `State` extractor expects.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
}

// FromRef lets extractors pull just the slice of state they need, so the auth
// extractors depend on (repo, config) rather than the whole AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// enforce
///
/// Shared body of the role-owned guard layers: runs the access core for one rule
/// and maps the decision onto HTTP.
///
/// - `Allow` lets the request through to the inner handler.
/// - `RedirectToSignIn` answers 401; the role-driven redirects answer 403. Each
///   carries a JSON body naming the client path the core wants the user on.
/// - The loading hold cannot occur for a server-verified principal, but if it
///   ever did the request answers 503 rather than leaking an allow.
async fn enforce(
    rule: &'static RouteRule,
    principal: &Principal,
    env: &Env,
    request: Request,
    next: Next,
) -> Response {
    let session = access::resolve_session(principal);
    let role = access::resolve_role(principal, env);

    match access::decide(session, role, rule) {
        Some(Decision::Allow) => next.run(request).await,
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        Some(decision) => {
            let status = match decision {
                Decision::RedirectToSignIn => StatusCode::UNAUTHORIZED,
                _ => StatusCode::FORBIDDEN,
            };
            let redirect = access::redirect_target(decision)
                .unwrap_or(access::ROOT_PATH)
                .to_string();
            (status, Json(models::RedirectBody { redirect })).into_response()
        }
    }
}

/// auth_guard
///
/// Guard layer for the `/auth` group. Session-only: role selection itself lives
/// behind this guard, so demanding an effective role here would lock a new user
/// out of the one endpoint that assigns roles. Only the Session Resolver runs;
/// the full rule evaluation applies to the role-owned groups below.
async fn auth_guard(
    CurrentPrincipal(principal): CurrentPrincipal,
    request: Request,
    next: Next,
) -> Response {
    match access::resolve_session(&principal) {
        SessionStatus::Loading => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        SessionStatus::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            Json(models::RedirectBody {
                redirect: access::SIGN_IN_PATH.to_string(),
            }),
        )
            .into_response(),
        SessionStatus::Authenticated => next.run(request).await,
    }
}

/// student_guard
///
/// Guard layer for the `/student` group.
async fn student_guard(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    request: Request,
    next: Next,
) -> Response {
    enforce(
        &access::STUDENT_RULE,
        &principal,
        &state.config.env,
        request,
        next,
    )
    .await
}

/// recruiter_guard
///
/// Guard layer for the `/recruiter` group.
async fn recruiter_guard(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    request: Request,
    next: Next,
) -> Response {
    enforce(
        &access::RECRUITER_RULE,
        &principal,
        &state.config.env,
        request,
        next,
    )
    .await
}

/// admin_guard
///
/// Guard layer for the `/admin` group. Handlers behind it re-check the Admin role
/// themselves as a second layer.
async fn admin_guard(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    request: Request,
    next: Next,
) -> Response {
    enforce(
        &access::ADMIN_RULE,
        &principal,
        &state.config.env,
        request,
        next,
    )
    .await
}

/// create_router
///
/// Assembles the full application router. Each role group is merged with its own
/// guard layer; the three role-owned layers funnel into the same `access::decide`
/// and the `/auth` layer runs the same core's Session Resolver, so there is
/// exactly one access-control implementation in the binary. The outer layers add
/// request-id correlation, per-request tracing spans, and permissive CORS (the
/// browser client runs on a different origin).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Unguarded: health, route-decision, dashboard redirect.
        .merge(public::public_routes())
        .merge(
            auth_routes::auth_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard)),
        )
        .merge(
            student::student_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), student_guard)),
        )
        .merge(recruiter::recruiter_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            recruiter_guard,
        )))
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_guard)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Stamp a fresh UUID on every request, open a span carrying it, and
                // echo it back to the caller, in that order.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(request_span)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// request_span
///
/// Span factory for `TraceLayer`: method, URI, and the generated request id, so
/// every log line emitted while serving one request correlates on `req_id`.
fn request_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
