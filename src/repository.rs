use crate::models::{
    AdminDashboardStats, ApplicantResponse, Application, ApplicationResponse, CreateJobRequest,
    JobPosting, StudentProfile, UpdateJobRequest, UpsertStudentProfileRequest, User,
    application_status, job_status,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, in-memory,
/// etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable and usable across Axum's asynchronous
/// task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    // Mirrors the auth provider's account on first authenticated touch.
    async fn create_user(&self, user: User) -> User;
    // Admin listing, optionally filtered by role token.
    async fn list_users(&self, role: Option<String>) -> Vec<User>;
    // Role write-back. The caller enforces the assignment policy (self-selection
    // vs. admin reassignment); this method only persists.
    async fn set_user_role(&self, id: Uuid, role: &str) -> Option<User>;
    // TPO account approval.
    async fn approve_user(&self, id: Uuid) -> Option<User>;

    // --- Student Profiles ---
    async fn get_student_profile(&self, user_id: Uuid) -> Option<StudentProfile>;
    async fn upsert_student_profile(
        &self,
        user_id: Uuid,
        req: UpsertStudentProfileRequest,
    ) -> StudentProfile;
    // Records the object key reserved by the presigned upload flow.
    async fn set_resume_key(&self, user_id: Uuid, key: &str) -> bool;

    // --- Job Postings ---
    // New postings always start in PENDING_APPROVAL.
    async fn create_job(&self, req: CreateJobRequest, recruiter_id: Uuid) -> JobPosting;
    async fn get_job(&self, id: Uuid) -> Option<JobPosting>;
    // Student listing. Must enforce status=ACTIVE and a future deadline.
    async fn list_active_jobs(
        &self,
        job_type: Option<String>,
        search: Option<String>,
        min_ctc: Option<f64>,
    ) -> Vec<JobPosting>;
    // Recruiter visibility: own postings only, any status.
    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> Vec<JobPosting>;
    // Admin visibility: every posting regardless of status or owner.
    async fn list_all_jobs(&self) -> Vec<JobPosting>;
    // Owner-Only: updates only if recruiter_id matches. Uses COALESCE for partial updates.
    async fn update_job(
        &self,
        id: Uuid,
        recruiter_id: Uuid,
        req: UpdateJobRequest,
    ) -> Option<JobPosting>;
    // Owner-Only: deletes only if recruiter_id matches.
    async fn delete_job(&self, id: Uuid, recruiter_id: Uuid) -> bool;
    // Owner-Only: ends the application window of an ACTIVE posting early.
    async fn close_job(&self, id: Uuid, recruiter_id: Uuid) -> Option<JobPosting>;
    // Admin moderation: approve (ACTIVE) or reject (REJECTED + reason).
    async fn set_job_status(
        &self,
        id: Uuid,
        status: &str,
        reason: Option<String>,
    ) -> Option<JobPosting>;

    // --- Applications ---
    // Idempotent: returns None when the (student, job) pair already applied.
    async fn create_application(
        &self,
        job_id: Uuid,
        student_id: Uuid,
        cover_note: Option<String>,
    ) -> Option<Application>;
    async fn get_application(&self, id: Uuid) -> Option<Application>;
    async fn list_applications_by_student(&self, student_id: Uuid) -> Vec<ApplicationResponse>;
    async fn list_applicants_for_job(&self, job_id: Uuid) -> Vec<ApplicantResponse>;
    // Recruiter review transition. The caller validates the target status.
    async fn set_application_status(&self, id: Uuid, status: &str) -> Option<Application>;
    // Owner-Only: withdraws only non-terminal applications belonging to student_id.
    async fn withdraw_application(&self, id: Uuid, student_id: Uuid) -> bool;

    // --- Analytics ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const JOB_COLUMNS: &str = "id, recruiter_id, company_name, title, description, job_type, \
     location, ctc_lpa, min_cgpa, branches, graduation_year, application_deadline, \
     status, rejection_reason, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, full_name, role, is_approved, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Mirrors the external auth account into `public.users`. `ON CONFLICT DO NOTHING`
    /// keeps the first-touch creation idempotent under concurrent requests.
    async fn create_user(&self, user: User) -> User {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, full_name, role, is_approved, created_at) \
             VALUES ($1, $2, $3, $4, false, NOW()) \
             ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email \
             RETURNING id, email, full_name, role, is_approved, created_at",
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.full_name)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create user")
    }

    async fn list_users(&self, role: Option<String>) -> Vec<User> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, email, full_name, role, is_approved, created_at FROM users WHERE 1=1",
        );
        if let Some(r) = role {
            builder.push(" AND role = ");
            builder.push_bind(r);
        }
        builder.push(" ORDER BY created_at DESC");

        match builder.build_query_as::<User>().fetch_all(&self.pool).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            }
        }
    }

    async fn set_user_role(&self, id: Uuid, role: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET role = $1 WHERE id = $2 \
             RETURNING id, email, full_name, role, is_approved, created_at",
        )
        .bind(role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_user_role error: {:?}", e);
            None
        })
    }

    async fn approve_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_approved = true WHERE id = $1 \
             RETURNING id, email, full_name, role, is_approved, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("approve_user error: {:?}", e);
            None
        })
    }

    async fn get_student_profile(&self, user_id: Uuid) -> Option<StudentProfile> {
        sqlx::query_as::<_, StudentProfile>(
            "SELECT user_id, branch, cgpa, graduation_year, active_backlogs, resume_key, \
             updated_at FROM student_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_student_profile error: {:?}", e);
            None
        })
    }

    async fn upsert_student_profile(
        &self,
        user_id: Uuid,
        req: UpsertStudentProfileRequest,
    ) -> StudentProfile {
        sqlx::query_as::<_, StudentProfile>(
            "INSERT INTO student_profiles \
             (user_id, branch, cgpa, graduation_year, active_backlogs, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 branch = EXCLUDED.branch, cgpa = EXCLUDED.cgpa, \
                 graduation_year = EXCLUDED.graduation_year, \
                 active_backlogs = EXCLUDED.active_backlogs, updated_at = NOW() \
             RETURNING user_id, branch, cgpa, graduation_year, active_backlogs, resume_key, \
                       updated_at",
        )
        .bind(user_id)
        .bind(req.branch)
        .bind(req.cgpa)
        .bind(req.graduation_year)
        .bind(req.active_backlogs)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to upsert student profile")
    }

    async fn set_resume_key(&self, user_id: Uuid, key: &str) -> bool {
        match sqlx::query(
            "UPDATE student_profiles SET resume_key = $1, updated_at = NOW() WHERE user_id = $2",
        )
        .bind(key)
        .bind(user_id)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("set_resume_key error: {:?}", e);
                false
            }
        }
    }

    /// create_job
    ///
    /// Inserts a new posting in `PENDING_APPROVAL`, awaiting TPO moderation.
    async fn create_job(&self, req: CreateJobRequest, recruiter_id: Uuid) -> JobPosting {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, JobPosting>(&format!(
            "INSERT INTO jobs (id, recruiter_id, company_name, title, description, job_type, \
             location, ctc_lpa, min_cgpa, branches, graduation_year, application_deadline, \
             status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW()) \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(new_id)
        .bind(recruiter_id)
        .bind(req.company_name)
        .bind(req.title)
        .bind(req.description)
        .bind(req.job_type)
        .bind(req.location)
        .bind(req.ctc_lpa)
        .bind(req.min_cgpa)
        .bind(req.branches)
        .bind(req.graduation_year)
        .bind(req.application_deadline)
        .bind(job_status::PENDING_APPROVAL)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert job posting")
    }

    async fn get_job(&self, id: Uuid) -> Option<JobPosting> {
        sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_job error: {:?}", e);
            None
        })
    }

    /// list_active_jobs
    ///
    /// Student-facing listing built with QueryBuilder for safe parameterization.
    /// **Visibility**: strictly enforces `status = ACTIVE` and a future deadline in
    /// the base query; filters only narrow the result further.
    async fn list_active_jobs(
        &self,
        job_type: Option<String>,
        search: Option<String>,
        min_ctc: Option<f64>,
    ) -> Vec<JobPosting> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = "
        ));
        builder.push_bind(job_status::ACTIVE);
        builder.push(" AND application_deadline > NOW()");

        if let Some(jt) = job_type {
            builder.push(" AND job_type = ");
            builder.push_bind(jt);
        }

        if let Some(s) = search {
            // Case-insensitive search across title, description, and company name.
            let search_pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR company_name ILIKE ");
            builder.push_bind(search_pattern);
            builder.push(")");
        }

        if let Some(ctc) = min_ctc {
            builder.push(" AND ctc_lpa >= ");
            builder.push_bind(ctc);
        }

        builder.push(" ORDER BY created_at DESC");

        match builder
            .build_query_as::<JobPosting>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("list_active_jobs error: {:?}", e);
                vec![]
            }
        }
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> Vec<JobPosting> {
        match sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE recruiter_id = $1 ORDER BY created_at DESC"
        ))
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("list_jobs_by_recruiter error: {:?}", e);
                vec![]
            }
        }
    }

    /// list_all_jobs
    ///
    /// TPO moderation queue: pending postings first, newest within each status.
    async fn list_all_jobs(&self) -> Vec<JobPosting> {
        match sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs \
             ORDER BY (status = 'PENDING_APPROVAL') DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("list_all_jobs error: {:?}", e);
                vec![]
            }
        }
    }

    /// update_job
    ///
    /// Updates a posting only if `recruiter_id` matches the owner. Uses COALESCE to
    /// handle `Option<T>` fields, touching a column only when the corresponding
    /// request field is `Some`.
    async fn update_job(
        &self,
        id: Uuid,
        recruiter_id: Uuid,
        req: UpdateJobRequest,
    ) -> Option<JobPosting> {
        sqlx::query_as::<_, JobPosting>(&format!(
            "UPDATE jobs SET \
                 title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 location = COALESCE($5, location), \
                 ctc_lpa = COALESCE($6, ctc_lpa), \
                 min_cgpa = COALESCE($7, min_cgpa), \
                 application_deadline = COALESCE($8, application_deadline), \
                 updated_at = NOW() \
             WHERE id = $1 AND recruiter_id = $2 \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(recruiter_id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.location)
        .bind(req.ctc_lpa)
        .bind(req.min_cgpa)
        .bind(req.application_deadline)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_job error: {:?}", e);
            None
        })
    }

    async fn delete_job(&self, id: Uuid, recruiter_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM jobs WHERE id = $1 AND recruiter_id = $2")
            .bind(id)
            .bind(recruiter_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_job error: {:?}", e);
                false
            }
        }
    }

    /// close_job
    ///
    /// The status predicate keeps the transition one-way: only an ACTIVE posting
    /// owned by `recruiter_id` moves to CLOSED; anything else affects 0 rows.
    async fn close_job(&self, id: Uuid, recruiter_id: Uuid) -> Option<JobPosting> {
        sqlx::query_as::<_, JobPosting>(&format!(
            "UPDATE jobs SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND recruiter_id = $2 AND status = $4 \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(recruiter_id)
        .bind(job_status::CLOSED)
        .bind(job_status::ACTIVE)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("close_job error: {:?}", e);
            None
        })
    }

    async fn set_job_status(
        &self,
        id: Uuid,
        status: &str,
        reason: Option<String>,
    ) -> Option<JobPosting> {
        sqlx::query_as::<_, JobPosting>(&format!(
            "UPDATE jobs SET status = $2, rejection_reason = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_job_status error: {:?}", e);
            None
        })
    }

    /// create_application
    ///
    /// Inserts an application. `ON CONFLICT DO NOTHING` on the (job, student)
    /// unique pair enforces **one application per posting per student**; the
    /// function returns `None` when nothing was inserted.
    async fn create_application(
        &self,
        job_id: Uuid,
        student_id: Uuid,
        cover_note: Option<String>,
    ) -> Option<Application> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, Application>(
            "INSERT INTO applications (id, job_id, student_id, status, cover_note, applied_at, \
             updated_at) VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             ON CONFLICT (job_id, student_id) DO NOTHING \
             RETURNING id, job_id, student_id, status, cover_note, applied_at, updated_at",
        )
        .bind(new_id)
        .bind(job_id)
        .bind(student_id)
        .bind(application_status::APPLIED)
        .bind(cover_note)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_application error: {:?}", e);
            None
        })
    }

    async fn get_application(&self, id: Uuid) -> Option<Application> {
        sqlx::query_as::<_, Application>(
            "SELECT id, job_id, student_id, status, cover_note, applied_at, updated_at \
             FROM applications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_application error: {:?}", e);
            None
        })
    }

    async fn list_applications_by_student(&self, student_id: Uuid) -> Vec<ApplicationResponse> {
        match sqlx::query_as::<_, ApplicationResponse>(
            "SELECT a.id, a.job_id, j.title AS job_title, j.company_name, a.status, \
             a.applied_at \
             FROM applications a JOIN jobs j ON a.job_id = j.id \
             WHERE a.student_id = $1 ORDER BY a.applied_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        {
            Ok(apps) => apps,
            Err(e) => {
                tracing::error!("list_applications_by_student error: {:?}", e);
                vec![]
            }
        }
    }

    async fn list_applicants_for_job(&self, job_id: Uuid) -> Vec<ApplicantResponse> {
        match sqlx::query_as::<_, ApplicantResponse>(
            "SELECT a.id, a.student_id, u.email AS student_email, u.full_name AS student_name, \
             a.status, a.cover_note, a.applied_at \
             FROM applications a JOIN users u ON a.student_id = u.id \
             WHERE a.job_id = $1 ORDER BY a.applied_at ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        {
            Ok(apps) => apps,
            Err(e) => {
                tracing::error!("list_applicants_for_job error: {:?}", e);
                vec![]
            }
        }
    }

    async fn set_application_status(&self, id: Uuid, status: &str) -> Option<Application> {
        sqlx::query_as::<_, Application>(
            "UPDATE applications SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING id, job_id, student_id, status, cover_note, applied_at, updated_at",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_application_status error: {:?}", e);
            None
        })
    }

    /// withdraw_application
    ///
    /// Withdraws only if `student_id` owns the application and the status is still
    /// non-terminal. A selected/rejected application stays on record.
    async fn withdraw_application(&self, id: Uuid, student_id: Uuid) -> bool {
        match sqlx::query(
            "UPDATE applications SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND student_id = $2 AND status IN ($4, $5)",
        )
        .bind(id)
        .bind(student_id)
        .bind(application_status::WITHDRAWN)
        .bind(application_status::APPLIED)
        .bind(application_status::SHORTLISTED)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("withdraw_application error: {:?}", e);
                false
            }
        }
    }

    /// get_stats
    ///
    /// Compiles all counters for the TPO dashboard in a single call.
    async fn get_stats(&self) -> AdminDashboardStats {
        let count = |sql: &'static str| {
            let pool = self.pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or(0)
            }
        };

        AdminDashboardStats {
            total_students: count("SELECT COUNT(*) FROM users WHERE role = 'STUDENT'").await,
            total_recruiters: count("SELECT COUNT(*) FROM users WHERE role = 'RECRUITER'").await,
            active_jobs: count("SELECT COUNT(*) FROM jobs WHERE status = 'ACTIVE'").await,
            pending_job_approvals: count(
                "SELECT COUNT(*) FROM jobs WHERE status = 'PENDING_APPROVAL'",
            )
            .await,
            total_applications: count("SELECT COUNT(*) FROM applications").await,
            selected_candidates: count(
                "SELECT COUNT(*) FROM applications WHERE status = 'SELECTED'",
            )
            .await,
        }
    }
}

/// MemoryRepository
///
/// In-memory implementation of the `Repository` trait, used by the test suite and
/// by local runs that don't have Postgres available. Semantics mirror the SQL
/// implementation (ownership checks, conflict idempotency, visibility predicates).
#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<HashMap<Uuid, User>>,
    profiles: RwLock<HashMap<Uuid, StudentProfile>>,
    jobs: RwLock<HashMap<Uuid, JobPosting>>,
    applications: RwLock<HashMap<Uuid, Application>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.read().expect("poisoned lock").get(&id).cloned()
    }

    async fn create_user(&self, user: User) -> User {
        let mut users = self.users.write().expect("poisoned lock");
        users.entry(user.id).or_insert(user).clone()
    }

    async fn list_users(&self, role: Option<String>) -> Vec<User> {
        let users = self.users.read().expect("poisoned lock");
        let mut out: Vec<User> = users
            .values()
            .filter(|u| role.as_ref().is_none_or(|r| u.role.as_deref() == Some(r)))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    async fn set_user_role(&self, id: Uuid, role: &str) -> Option<User> {
        let mut users = self.users.write().expect("poisoned lock");
        users.get_mut(&id).map(|u| {
            u.role = Some(role.to_string());
            u.clone()
        })
    }

    async fn approve_user(&self, id: Uuid) -> Option<User> {
        let mut users = self.users.write().expect("poisoned lock");
        users.get_mut(&id).map(|u| {
            u.is_approved = true;
            u.clone()
        })
    }

    async fn get_student_profile(&self, user_id: Uuid) -> Option<StudentProfile> {
        self.profiles
            .read()
            .expect("poisoned lock")
            .get(&user_id)
            .cloned()
    }

    async fn upsert_student_profile(
        &self,
        user_id: Uuid,
        req: UpsertStudentProfileRequest,
    ) -> StudentProfile {
        let mut profiles = self.profiles.write().expect("poisoned lock");
        let resume_key = profiles.get(&user_id).and_then(|p| p.resume_key.clone());
        let profile = StudentProfile {
            user_id,
            branch: req.branch,
            cgpa: req.cgpa,
            graduation_year: req.graduation_year,
            active_backlogs: req.active_backlogs,
            resume_key,
            updated_at: Utc::now(),
        };
        profiles.insert(user_id, profile.clone());
        profile
    }

    async fn set_resume_key(&self, user_id: Uuid, key: &str) -> bool {
        let mut profiles = self.profiles.write().expect("poisoned lock");
        match profiles.get_mut(&user_id) {
            Some(p) => {
                p.resume_key = Some(key.to_string());
                p.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    async fn create_job(&self, req: CreateJobRequest, recruiter_id: Uuid) -> JobPosting {
        let now = Utc::now();
        let job = JobPosting {
            id: Uuid::new_v4(),
            recruiter_id,
            company_name: req.company_name,
            title: req.title,
            description: req.description,
            job_type: req.job_type,
            location: req.location,
            ctc_lpa: req.ctc_lpa,
            min_cgpa: req.min_cgpa,
            branches: req.branches,
            graduation_year: req.graduation_year,
            application_deadline: req.application_deadline,
            status: job_status::PENDING_APPROVAL.to_string(),
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs
            .write()
            .expect("poisoned lock")
            .insert(job.id, job.clone());
        job
    }

    async fn get_job(&self, id: Uuid) -> Option<JobPosting> {
        self.jobs.read().expect("poisoned lock").get(&id).cloned()
    }

    async fn list_active_jobs(
        &self,
        job_type: Option<String>,
        search: Option<String>,
        min_ctc: Option<f64>,
    ) -> Vec<JobPosting> {
        let now = Utc::now();
        let needle = search.map(|s| s.to_lowercase());
        let jobs = self.jobs.read().expect("poisoned lock");
        let mut out: Vec<JobPosting> = jobs
            .values()
            .filter(|j| j.is_open(now))
            .filter(|j| job_type.as_ref().is_none_or(|t| &j.job_type == t))
            .filter(|j| {
                needle.as_ref().is_none_or(|n| {
                    j.title.to_lowercase().contains(n)
                        || j.description.to_lowercase().contains(n)
                        || j.company_name.to_lowercase().contains(n)
                })
            })
            .filter(|j| min_ctc.is_none_or(|c| j.ctc_lpa >= c))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> Vec<JobPosting> {
        let jobs = self.jobs.read().expect("poisoned lock");
        let mut out: Vec<JobPosting> = jobs
            .values()
            .filter(|j| j.recruiter_id == recruiter_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    async fn list_all_jobs(&self) -> Vec<JobPosting> {
        let jobs = self.jobs.read().expect("poisoned lock");
        let mut out: Vec<JobPosting> = jobs.values().cloned().collect();
        // Pending postings first, newest within each group.
        out.sort_by(|a, b| {
            let a_pending = a.status == job_status::PENDING_APPROVAL;
            let b_pending = b.status == job_status::PENDING_APPROVAL;
            b_pending
                .cmp(&a_pending)
                .then(b.created_at.cmp(&a.created_at))
        });
        out
    }

    async fn update_job(
        &self,
        id: Uuid,
        recruiter_id: Uuid,
        req: UpdateJobRequest,
    ) -> Option<JobPosting> {
        let mut jobs = self.jobs.write().expect("poisoned lock");
        let job = jobs.get_mut(&id).filter(|j| j.recruiter_id == recruiter_id)?;
        if let Some(title) = req.title {
            job.title = title;
        }
        if let Some(description) = req.description {
            job.description = description;
        }
        if let Some(location) = req.location {
            job.location = location;
        }
        if let Some(ctc) = req.ctc_lpa {
            job.ctc_lpa = ctc;
        }
        if let Some(cgpa) = req.min_cgpa {
            job.min_cgpa = cgpa;
        }
        if let Some(deadline) = req.application_deadline {
            job.application_deadline = deadline;
        }
        job.updated_at = Utc::now();
        Some(job.clone())
    }

    async fn delete_job(&self, id: Uuid, recruiter_id: Uuid) -> bool {
        let mut jobs = self.jobs.write().expect("poisoned lock");
        match jobs.get(&id) {
            Some(j) if j.recruiter_id == recruiter_id => {
                jobs.remove(&id);
                true
            }
            _ => false,
        }
    }

    async fn close_job(&self, id: Uuid, recruiter_id: Uuid) -> Option<JobPosting> {
        let mut jobs = self.jobs.write().expect("poisoned lock");
        let job = jobs
            .get_mut(&id)
            .filter(|j| j.recruiter_id == recruiter_id && j.status == job_status::ACTIVE)?;
        job.status = job_status::CLOSED.to_string();
        job.updated_at = Utc::now();
        Some(job.clone())
    }

    async fn set_job_status(
        &self,
        id: Uuid,
        status: &str,
        reason: Option<String>,
    ) -> Option<JobPosting> {
        let mut jobs = self.jobs.write().expect("poisoned lock");
        jobs.get_mut(&id).map(|j| {
            j.status = status.to_string();
            j.rejection_reason = reason;
            j.updated_at = Utc::now();
            j.clone()
        })
    }

    async fn create_application(
        &self,
        job_id: Uuid,
        student_id: Uuid,
        cover_note: Option<String>,
    ) -> Option<Application> {
        let mut applications = self.applications.write().expect("poisoned lock");
        let duplicate = applications
            .values()
            .any(|a| a.job_id == job_id && a.student_id == student_id);
        if duplicate {
            return None;
        }
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            job_id,
            student_id,
            status: application_status::APPLIED.to_string(),
            cover_note,
            applied_at: now,
            updated_at: now,
        };
        applications.insert(application.id, application.clone());
        Some(application)
    }

    async fn get_application(&self, id: Uuid) -> Option<Application> {
        self.applications
            .read()
            .expect("poisoned lock")
            .get(&id)
            .cloned()
    }

    async fn list_applications_by_student(&self, student_id: Uuid) -> Vec<ApplicationResponse> {
        let applications = self.applications.read().expect("poisoned lock");
        let jobs = self.jobs.read().expect("poisoned lock");
        let mut out: Vec<ApplicationResponse> = applications
            .values()
            .filter(|a| a.student_id == student_id)
            .filter_map(|a| {
                let job = jobs.get(&a.job_id)?;
                Some(ApplicationResponse {
                    id: a.id,
                    job_id: a.job_id,
                    job_title: job.title.clone(),
                    company_name: job.company_name.clone(),
                    status: a.status.clone(),
                    applied_at: a.applied_at,
                })
            })
            .collect();
        out.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        out
    }

    async fn list_applicants_for_job(&self, job_id: Uuid) -> Vec<ApplicantResponse> {
        let applications = self.applications.read().expect("poisoned lock");
        let users = self.users.read().expect("poisoned lock");
        let mut out: Vec<ApplicantResponse> = applications
            .values()
            .filter(|a| a.job_id == job_id)
            .filter_map(|a| {
                let student = users.get(&a.student_id)?;
                Some(ApplicantResponse {
                    id: a.id,
                    student_id: a.student_id,
                    student_email: student.email.clone(),
                    student_name: student.full_name.clone(),
                    status: a.status.clone(),
                    cover_note: a.cover_note.clone(),
                    applied_at: a.applied_at,
                })
            })
            .collect();
        out.sort_by(|a, b| a.applied_at.cmp(&b.applied_at));
        out
    }

    async fn set_application_status(&self, id: Uuid, status: &str) -> Option<Application> {
        let mut applications = self.applications.write().expect("poisoned lock");
        applications.get_mut(&id).map(|a| {
            a.status = status.to_string();
            a.updated_at = Utc::now();
            a.clone()
        })
    }

    async fn withdraw_application(&self, id: Uuid, student_id: Uuid) -> bool {
        let mut applications = self.applications.write().expect("poisoned lock");
        match applications.get_mut(&id) {
            Some(a)
                if a.student_id == student_id
                    && (a.status == application_status::APPLIED
                        || a.status == application_status::SHORTLISTED) =>
            {
                a.status = application_status::WITHDRAWN.to_string();
                a.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        let users = self.users.read().expect("poisoned lock");
        let jobs = self.jobs.read().expect("poisoned lock");
        let applications = self.applications.read().expect("poisoned lock");
        AdminDashboardStats {
            total_students: users
                .values()
                .filter(|u| u.role.as_deref() == Some("STUDENT"))
                .count() as i64,
            total_recruiters: users
                .values()
                .filter(|u| u.role.as_deref() == Some("RECRUITER"))
                .count() as i64,
            active_jobs: jobs
                .values()
                .filter(|j| j.status == job_status::ACTIVE)
                .count() as i64,
            pending_job_approvals: jobs
                .values()
                .filter(|j| j.status == job_status::PENDING_APPROVAL)
                .count() as i64,
            total_applications: applications.len() as i64,
            selected_candidates: applications
                .values()
                .filter(|a| a.status == application_status::SELECTED)
                .count() as i64,
        }
    }
}
