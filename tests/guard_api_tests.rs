use chrono::Utc;
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

/// Boots the full router over the in-memory repository and mock storage, in
/// `Env::Local` so the `x-user-id` / `x-dev-role` development headers work.
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

async fn seed_user(repo: &RepositoryState, role: Option<&str>, approved: bool) -> Uuid {
    let id = Uuid::new_v4();
    repo.create_user(User {
        id,
        email: format!("user_{}@placeme.test", id.simple()),
        full_name: "Test User".to_string(),
        role: role.map(str::to_string),
        is_approved: approved,
        created_at: Utc::now(),
    })
    .await;
    id
}

/// Client that surfaces 3xx responses instead of following them.
fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_anonymous_caller_is_sent_to_sign_in() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/student/jobs", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["redirect"], "/sign-in");
}

#[tokio::test]
async fn test_role_less_caller_is_sent_to_role_selection() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app.repo, None, false).await;

    let response = client
        .get(format!("{}/student/jobs", app.address))
        .header("x-user-id", user_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["redirect"], "/role-selection");
}

#[tokio::test]
async fn test_student_bounces_off_admin_routes_to_own_dashboard() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let student_id = seed_user(&app.repo, Some("STUDENT"), true).await;

    let response = client
        .get(format!("{}/admin/stats", app.address))
        .header("x-user-id", student_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["redirect"], "/student");
}

#[tokio::test]
async fn test_allowed_roles_pass_their_own_guard() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let student_id = seed_user(&app.repo, Some("STUDENT"), true).await;
    let response = client
        .get(format!("{}/student/jobs", app.address))
        .header("x-user-id", student_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let admin_id = seed_user(&app.repo, Some("ADMIN"), true).await;
    let response = client
        .get(format!("{}/admin/stats", app.address))
        .header("x-user-id", admin_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_malformed_stored_role_fails_closed() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    // A corrupted role value in the store must behave like no role at all.
    let user_id = seed_user(&app.repo, Some("SUPERUSER"), true).await;

    let response = client
        .get(format!("{}/student/jobs", app.address))
        .header("x-user-id", user_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["redirect"], "/role-selection");
}

#[tokio::test]
async fn test_dev_fallback_role_is_honored_in_local_env() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app.repo, None, false).await;

    // No stored role, but the dev header supplies a fallback under Env::Local.
    let response = client
        .get(format!("{}/admin/stats", app.address))
        .header("x-user-id", user_id.to_string())
        .header("x-dev-role", "ADMIN")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_dashboard_redirect_targets_owning_dashboard() {
    let app = spawn_app().await;
    let client = no_redirect_client();

    let recruiter_id = seed_user(&app.repo, Some("RECRUITER"), true).await;
    let response = client
        .get(format!("{}/dashboard", app.address))
        .header("x-user-id", recruiter_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "/recruiter"
    );
}

#[tokio::test]
async fn test_dashboard_redirect_sends_anonymous_to_sign_in() {
    let app = spawn_app().await;
    let client = no_redirect_client();

    let response = client
        .get(format!("{}/dashboard", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "/sign-in"
    );
}

#[tokio::test]
async fn test_route_decision_endpoint_mirrors_the_guard() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Anonymous caller asking about a guarded path.
    let response = client
        .get(format!("{}/route-decision?path=/recruiter/jobs", app.address))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["decision"], "SIGN_IN");
    assert_eq!(body["redirect"], "/sign-in");

    // Unlisted paths are public.
    let response = client
        .get(format!("{}/route-decision?path=/about", app.address))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["decision"], "ALLOW");
    assert!(body["redirect"].is_null());

    // A student asking about the admin area is pointed at their own dashboard.
    let student_id = seed_user(&app.repo, Some("STUDENT"), true).await;
    let response = client
        .get(format!("{}/route-decision?path=/admin/users", app.address))
        .header("x-user-id", student_id.to_string())
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["decision"], "DASHBOARD");
    assert_eq!(body["redirect"], "/student");
}

#[tokio::test]
async fn test_auth_group_admits_role_less_users() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app.repo, None, false).await;

    // /auth is any-authenticated: a user who has not picked a role yet must be
    // able to reach their profile and the role write-back.
    let response = client
        .get(format!("{}/auth/me", app.address))
        .header("x-user-id", user_id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["role"].is_null());
}

#[tokio::test]
async fn test_role_selection_write_back_is_immutable() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app.repo, None, false).await;

    // ADMIN is never self-assignable.
    let response = client
        .post(format!("{}/auth/role", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({ "role": "ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // First selection succeeds.
    let response = client
        .post(format!("{}/auth/role", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({ "role": "STUDENT" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["role"], "STUDENT");

    // A second selection is rejected; reassignment is an admin action.
    let response = client
        .post(format!("{}/auth/role", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({ "role": "RECRUITER" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_admin_can_reassign_roles() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin_id = seed_user(&app.repo, Some("ADMIN"), true).await;
    let user_id = seed_user(&app.repo, Some("STUDENT"), true).await;

    let response = client
        .patch(format!("{}/admin/users/{}/role", app.address, user_id))
        .header("x-user-id", admin_id.to_string())
        .json(&serde_json::json!({ "role": "RECRUITER" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["role"], "RECRUITER");
}
