use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Status Vocabularies ---

/// Job posting lifecycle: `PENDING_APPROVAL → ACTIVE | REJECTED`, then
/// `ACTIVE → CLOSED`. Every new posting starts pending; only an admin moves it.
pub mod job_status {
    pub const PENDING_APPROVAL: &str = "PENDING_APPROVAL";
    pub const ACTIVE: &str = "ACTIVE";
    pub const REJECTED: &str = "REJECTED";
    pub const CLOSED: &str = "CLOSED";
}

/// Application lifecycle: `APPLIED → SHORTLISTED → SELECTED | REJECTED`, with
/// `WITHDRAWN` reachable by the owning student from any non-terminal state.
pub mod application_status {
    pub const APPLIED: &str = "APPLIED";
    pub const SHORTLISTED: &str = "SHORTLISTED";
    pub const SELECTED: &str = "SELECTED";
    pub const REJECTED: &str = "REJECTED";
    pub const WITHDRAWN: &str = "WITHDRAWN";
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The user's canonical identity record in the `public.users` table, mirroring the
/// external auth provider's account. `role` stays NULL until the user completes
/// role selection; the raw string is parsed to a typed role only at the auth
/// boundary (`access::Role::parse`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary Key, synchronized with the auth provider's user id.
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    // Canonical role token ('STUDENT' | 'RECRUITER' | 'ADMIN') or NULL before
    // role selection.
    pub role: Option<String>,
    // Account approval flag managed by the TPO. Recruiters must be approved
    // before they can post jobs.
    pub is_approved: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// StudentProfile
///
/// Academic record backing the eligibility check, one row per student.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct StudentProfile {
    pub user_id: Uuid,
    pub branch: String,
    pub cgpa: f64,
    pub graduation_year: i32,
    pub active_backlogs: i32,
    // S3 key of the uploaded resume PDF, set after the presigned upload completes.
    pub resume_key: Option<String>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// JobPosting
///
/// A recruiter's job posting with its eligibility criteria and approval state.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct JobPosting {
    pub id: Uuid,
    // FK to public.users.id (the posting recruiter).
    pub recruiter_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub description: String,
    // 'Full-time' | 'Internship' | 'Part-time' | 'Contract' (free-form, validated
    // client-side).
    pub job_type: String,
    pub location: String,
    // Annual package in LPA.
    pub ctc_lpa: f64,

    // Eligibility criteria
    pub min_cgpa: f64,
    pub branches: Vec<String>,
    pub graduation_year: i32,

    #[ts(type = "string")]
    pub application_deadline: DateTime<Utc>,
    // See [`job_status`].
    pub status: String,
    pub rejection_reason: Option<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl JobPosting {
    /// Whether the posting currently accepts applications.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == job_status::ACTIVE && self.application_deadline > now
    }

    /// check_eligibility
    ///
    /// Pure eligibility gate over a student's academic record. Criteria are
    /// evaluated in a fixed order and the first failing one is reported.
    pub fn check_eligibility(&self, profile: &StudentProfile) -> Result<(), &'static str> {
        if profile.cgpa < self.min_cgpa {
            return Err("CGPA below minimum requirement");
        }
        if !self.branches.iter().any(|b| b == &profile.branch) {
            return Err("Branch not eligible");
        }
        if profile.graduation_year != self.graduation_year {
            return Err("Graduation year mismatch");
        }
        if profile.active_backlogs > 0 {
            return Err("Active backlogs not allowed");
        }
        Ok(())
    }
}

/// Application
///
/// A student's application to a job posting. One application per (student, job),
/// enforced by a composite unique constraint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub student_id: Uuid,
    // See [`application_status`].
    pub status: String,
    pub cover_note: Option<String>,
    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// SelectRoleRequest
///
/// Role-selection write-back payload (POST /auth/role). Only STUDENT and
/// RECRUITER are self-assignable; ADMIN is granted through the admin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SelectRoleRequest {
    pub role: String,
}

/// UpdateUserRoleRequest
///
/// Admin role reassignment payload (PATCH /admin/users/{id}/role). Accepts any of
/// the three canonical tokens.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRoleRequest {
    pub role: String,
}

/// CreateJobRequest
///
/// Input payload for posting a new job (POST /recruiter/jobs).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateJobRequest {
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub job_type: String,
    pub location: String,
    pub ctc_lpa: f64,
    pub min_cgpa: f64,
    pub branches: Vec<String>,
    pub graduation_year: i32,
    #[ts(type = "string")]
    pub application_deadline: DateTime<Utc>,
}

/// UpdateJobRequest
///
/// Partial update payload for a posting (PUT /recruiter/jobs/{id}). Uses
/// `Option<T>` for all fields with `skip_serializing_if` so only provided fields
/// travel in the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctc_lpa: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_cgpa: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub application_deadline: Option<DateTime<Utc>>,
}

/// ApplyRequest
///
/// Input payload for applying to a posting (POST /student/jobs/{id}/apply).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApplyRequest {
    pub cover_note: Option<String>,
}

/// UpdateApplicationStatusRequest
///
/// Recruiter review payload (PATCH /recruiter/applications/{id}/status).
/// Permitted targets: SHORTLISTED, SELECTED, REJECTED.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateApplicationStatusRequest {
    pub status: String,
}

/// RejectJobRequest
///
/// Admin rejection payload (POST /admin/jobs/{id}/reject).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RejectJobRequest {
    pub reason: String,
}

/// UpsertStudentProfileRequest
///
/// Input payload for creating or replacing the caller's academic profile
/// (PUT /student/profile).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpsertStudentProfileRequest {
    pub branch: String,
    pub cgpa: f64,
    pub graduation_year: i32,
    pub active_backlogs: i32,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived S3 upload URL for a resume
/// (POST /student/resume/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "resume.pdf")]
    pub filename: String,
    /// The MIME type, used to constrain the S3 upload to the allowed type.
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

/// PresignedUrlResponse
///
/// Output schema containing the temporary URL for client-to-cloud file transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The S3 object key where the file will be stored.
    pub resource_key: String,
}

// --- Output Schemas ---

/// UserProfile
///
/// Output schema for the authenticated user's own profile (GET /auth/me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Option<String>,
    pub is_approved: bool,
}

/// ApplicationResponse
///
/// A student's application enriched with posting details (GET /student/applications).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    // Loaded via a JOIN on the postings table.
    pub job_title: String,
    pub company_name: String,
    pub status: String,
    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
}

/// ApplicantResponse
///
/// One applicant row for the recruiter's review table
/// (GET /recruiter/jobs/{id}/applications), enriched with the student's identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ApplicantResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_email: String,
    pub student_name: String,
    pub status: String,
    pub cover_note: Option<String>,
    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
}

/// AdminDashboardStats
///
/// Output schema for the TPO statistics dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_students: i64,
    pub total_recruiters: i64,
    pub active_jobs: i64,
    /// The number of postings still in `PENDING_APPROVAL`.
    pub pending_job_approvals: i64,
    pub total_applications: i64,
    pub selected_candidates: i64,
}

/// RedirectBody
///
/// JSON body attached to 401/403 guard responses so the client knows where the
/// access core wants the user to land.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RedirectBody {
    pub redirect: String,
}

/// RouteDecisionResponse
///
/// Wire form of an Access Guard decision (GET /route-decision). `decision` is one
/// of `ALLOW`, `SIGN_IN`, `ROLE_SELECTION`, `DASHBOARD`, `HOLD`; `redirect` is the
/// target path for the redirecting variants.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RouteDecisionResponse {
    pub decision: String,
    pub redirect: Option<String>,
}
