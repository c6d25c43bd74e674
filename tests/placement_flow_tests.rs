use chrono::{Duration, Utc};
use placeme_portal::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    models::User,
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub repo: RepositoryState,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;
    let storage = Arc::new(MockStorageService::new()) as StorageState;
    let config = AppConfig::default();

    let state = AppState {
        repo: repo.clone(),
        storage,
        config,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

async fn seed_user(repo: &RepositoryState, role: &str, approved: bool) -> Uuid {
    let id = Uuid::new_v4();
    repo.create_user(User {
        id,
        email: format!("user_{}@placeme.test", id.simple()),
        full_name: "Test User".to_string(),
        role: Some(role.to_string()),
        is_approved: approved,
        created_at: Utc::now(),
    })
    .await;
    id
}

fn job_payload(deadline_days: i64) -> serde_json::Value {
    serde_json::json!({
        "company_name": "Initech",
        "title": "Graduate Software Engineer",
        "description": "Backend role on the billing platform.",
        "job_type": "Full-time",
        "location": "Pune",
        "ctc_lpa": 12.5,
        "min_cgpa": 7.0,
        "branches": ["CSE", "IT"],
        "graduation_year": 2026,
        "application_deadline": (Utc::now() + Duration::days(deadline_days)).to_rfc3339(),
    })
}

fn eligible_profile() -> serde_json::Value {
    serde_json::json!({
        "branch": "CSE",
        "cgpa": 8.4,
        "graduation_year": 2026,
        "active_backlogs": 0,
    })
}

#[tokio::test]
async fn test_job_approval_and_application_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let recruiter = seed_user(&app.repo, "RECRUITER", true).await;
    let admin = seed_user(&app.repo, "ADMIN", true).await;
    let student = seed_user(&app.repo, "STUDENT", true).await;

    // 1. Recruiter posts a job; it lands in the approval queue.
    let response = client
        .post(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", recruiter.to_string())
        .json(&job_payload(30))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let job: serde_json::Value = response.json().await.unwrap();
    assert_eq!(job["status"], "PENDING_APPROVAL");
    let job_id = job["id"].as_str().unwrap().to_string();

    // 2. Pending postings are invisible to students.
    let listing: serde_json::Value = client
        .get(format!("{}/student/jobs", app.address))
        .header("x-user-id", student.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 0);

    // 3. Admin approves.
    let response = client
        .post(format!("{}/admin/jobs/{}/approve", app.address, job_id))
        .header("x-user-id", admin.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let approved: serde_json::Value = response.json().await.unwrap();
    assert_eq!(approved["status"], "ACTIVE");

    // 4. The posting is now visible and retrievable.
    let listing: serde_json::Value = client
        .get(format!("{}/student/jobs", app.address))
        .header("x-user-id", student.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 1);

    // 5. Applying without a profile is rejected with a reason.
    let response = client
        .post(format!("{}/student/jobs/{}/apply", app.address, job_id))
        .header("x-user-id", student.to_string())
        .json(&serde_json::json!({ "cover_note": "Keen to join." }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    // 6. Student completes their profile and applies.
    let response = client
        .put(format!("{}/student/profile", app.address))
        .header("x-user-id", student.to_string())
        .json(&eligible_profile())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{}/student/jobs/{}/apply", app.address, job_id))
        .header("x-user-id", student.to_string())
        .json(&serde_json::json!({ "cover_note": "Keen to join." }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let application: serde_json::Value = response.json().await.unwrap();
    assert_eq!(application["status"], "APPLIED");
    let application_id = application["id"].as_str().unwrap().to_string();

    // 7. A second application to the same posting is rejected idempotently.
    let response = client
        .post(format!("{}/student/jobs/{}/apply", app.address, job_id))
        .header("x-user-id", student.to_string())
        .json(&serde_json::json!({ "cover_note": "Again." }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // 8. Recruiter reviews the applicant pool and shortlists.
    let applicants: serde_json::Value = client
        .get(format!(
            "{}/recruiter/jobs/{}/applications",
            app.address, job_id
        ))
        .header("x-user-id", recruiter.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(applicants.as_array().unwrap().len(), 1);
    assert_eq!(applicants[0]["id"].as_str().unwrap(), application_id);

    let response = client
        .patch(format!(
            "{}/recruiter/applications/{}/status",
            app.address, application_id
        ))
        .header("x-user-id", recruiter.to_string())
        .json(&serde_json::json!({ "status": "SHORTLISTED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // 9. Student withdraws; the withdrawn application is then immutable.
    let response = client
        .patch(format!(
            "{}/student/applications/{}/withdraw",
            app.address, application_id
        ))
        .header("x-user-id", student.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .patch(format!(
            "{}/recruiter/applications/{}/status",
            app.address, application_id
        ))
        .header("x-user-id", recruiter.to_string())
        .json(&serde_json::json!({ "status": "SELECTED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // 10. The student's application history reflects the final state.
    let mine: serde_json::Value = client
        .get(format!("{}/student/applications", app.address))
        .header("x-user-id", student.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine[0]["status"], "WITHDRAWN");
    assert_eq!(mine[0]["job_title"], "Graduate Software Engineer");
}

#[tokio::test]
async fn test_unapproved_recruiter_cannot_post() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let recruiter = seed_user(&app.repo, "RECRUITER", false).await;

    let response = client
        .post(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", recruiter.to_string())
        .json(&job_payload(30))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_ineligible_student_is_rejected_with_reason() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let recruiter = seed_user(&app.repo, "RECRUITER", true).await;
    let admin = seed_user(&app.repo, "ADMIN", true).await;
    let student = seed_user(&app.repo, "STUDENT", true).await;

    let job: serde_json::Value = client
        .post(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", recruiter.to_string())
        .json(&job_payload(30))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = job["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/admin/jobs/{}/approve", app.address, job_id))
        .header("x-user-id", admin.to_string())
        .send()
        .await
        .unwrap();

    // CGPA below the posting's bar.
    client
        .put(format!("{}/student/profile", app.address))
        .header("x-user-id", student.to_string())
        .json(&serde_json::json!({
            "branch": "CSE",
            "cgpa": 6.1,
            "graduation_year": 2026,
            "active_backlogs": 0,
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/student/jobs/{}/apply", app.address, job_id))
        .header("x-user-id", student.to_string())
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let reason = response.text().await.unwrap();
    assert!(reason.contains("CGPA"));
}

#[tokio::test]
async fn test_expired_deadline_closes_applications() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let recruiter = seed_user(&app.repo, "RECRUITER", true).await;
    let admin = seed_user(&app.repo, "ADMIN", true).await;
    let student = seed_user(&app.repo, "STUDENT", true).await;

    // Deadline already in the past.
    let job: serde_json::Value = client
        .post(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", recruiter.to_string())
        .json(&job_payload(-1))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = job["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/admin/jobs/{}/approve", app.address, job_id))
        .header("x-user-id", admin.to_string())
        .send()
        .await
        .unwrap();

    // Not listed as open.
    let listing: serde_json::Value = client
        .get(format!("{}/student/jobs", app.address))
        .header("x-user-id", student.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 0);

    // Applying answers 410 Gone.
    client
        .put(format!("{}/student/profile", app.address))
        .header("x-user-id", student.to_string())
        .json(&eligible_profile())
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/student/jobs/{}/apply", app.address, job_id))
        .header("x-user-id", student.to_string())
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 410);
}

#[tokio::test]
async fn test_closed_posting_leaves_listing_and_rejects_applications() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let recruiter = seed_user(&app.repo, "RECRUITER", true).await;
    let admin = seed_user(&app.repo, "ADMIN", true).await;
    let student = seed_user(&app.repo, "STUDENT", true).await;

    let job: serde_json::Value = client
        .post(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", recruiter.to_string())
        .json(&job_payload(30))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = job["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/admin/jobs/{}/approve", app.address, job_id))
        .header("x-user-id", admin.to_string())
        .send()
        .await
        .unwrap();

    // A pending posting cannot be closed, and neither can someone else's.
    let other = seed_user(&app.repo, "RECRUITER", true).await;
    let response = client
        .patch(format!("{}/recruiter/jobs/{}/close", app.address, job_id))
        .header("x-user-id", other.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // The owner ends the application window early.
    let response = client
        .patch(format!("{}/recruiter/jobs/{}/close", app.address, job_id))
        .header("x-user-id", recruiter.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let closed: serde_json::Value = response.json().await.unwrap();
    assert_eq!(closed["status"], "CLOSED");

    // Gone from the student listing, and applying now answers 410.
    let listing: serde_json::Value = client
        .get(format!("{}/student/jobs", app.address))
        .header("x-user-id", student.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 0);

    client
        .put(format!("{}/student/profile", app.address))
        .header("x-user-id", student.to_string())
        .json(&eligible_profile())
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/student/jobs/{}/apply", app.address, job_id))
        .header("x-user-id", student.to_string())
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 410);

    // Closing twice is not a transition the repository accepts.
    let response = client
        .patch(format!("{}/recruiter/jobs/{}/close", app.address, job_id))
        .header("x-user-id", recruiter.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_job_ownership_is_enforced() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let owner = seed_user(&app.repo, "RECRUITER", true).await;
    let other = seed_user(&app.repo, "RECRUITER", true).await;

    let job: serde_json::Value = client
        .post(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", owner.to_string())
        .json(&job_payload(30))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = job["id"].as_str().unwrap().to_string();

    // A different recruiter can neither update, delete, nor read applicants.
    let response = client
        .put(format!("{}/recruiter/jobs/{}", app.address, job_id))
        .header("x-user-id", other.to_string())
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .delete(format!("{}/recruiter/jobs/{}", app.address, job_id))
        .header("x-user-id", other.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!(
            "{}/recruiter/jobs/{}/applications",
            app.address, job_id
        ))
        .header("x-user-id", other.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_rejected_posting_carries_reason_for_recruiter() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let recruiter = seed_user(&app.repo, "RECRUITER", true).await;
    let admin = seed_user(&app.repo, "ADMIN", true).await;

    let job: serde_json::Value = client
        .post(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", recruiter.to_string())
        .json(&job_payload(30))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = job["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/admin/jobs/{}/reject", app.address, job_id))
        .header("x-user-id", admin.to_string())
        .json(&serde_json::json!({ "reason": "Package below placement policy floor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let mine: serde_json::Value = client
        .get(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", recruiter.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine[0]["status"], "REJECTED");
    assert_eq!(
        mine[0]["rejection_reason"],
        "Package below placement policy floor"
    );
}

#[tokio::test]
async fn test_admin_stats_reflect_portal_activity() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let recruiter = seed_user(&app.repo, "RECRUITER", true).await;
    let admin = seed_user(&app.repo, "ADMIN", true).await;
    seed_user(&app.repo, "STUDENT", true).await;

    let job: serde_json::Value = client
        .post(format!("{}/recruiter/jobs", app.address))
        .header("x-user-id", recruiter.to_string())
        .json(&job_payload(30))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = job["id"].as_str().unwrap().to_string();

    let stats: serde_json::Value = client
        .get(format!("{}/admin/stats", app.address))
        .header("x-user-id", admin.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_students"], 1);
    assert_eq!(stats["total_recruiters"], 1);
    assert_eq!(stats["pending_job_approvals"], 1);
    assert_eq!(stats["active_jobs"], 0);

    client
        .post(format!("{}/admin/jobs/{}/approve", app.address, job_id))
        .header("x-user-id", admin.to_string())
        .send()
        .await
        .unwrap();

    let stats: serde_json::Value = client
        .get(format!("{}/admin/stats", app.address))
        .header("x-user-id", admin.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["pending_job_approvals"], 0);
    assert_eq!(stats["active_jobs"], 1);
}

#[tokio::test]
async fn test_resume_presign_records_key_on_profile() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let student = seed_user(&app.repo, "STUDENT", true).await;

    client
        .put(format!("{}/student/profile", app.address))
        .header("x-user-id", student.to_string())
        .json(&eligible_profile())
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/student/resume/presigned", app.address))
        .header("x-user-id", student.to_string())
        .json(&serde_json::json!({
            "filename": "resume.pdf",
            "file_type": "application/pdf",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["upload_url"].as_str().unwrap().contains("signature=fake"));
    let key = body["resource_key"].as_str().unwrap().to_string();
    assert!(key.starts_with(&format!("resumes/{}/", student)));
    assert!(key.ends_with(".pdf"));

    // The reserved key is recorded on the profile.
    let profile: serde_json::Value = client
        .get(format!("{}/student/profile", app.address))
        .header("x-user-id", student.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["resume_key"], key);
}
