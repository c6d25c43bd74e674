use chrono::{Duration, Utc};
use placeme_portal::access::Role;
use placeme_portal::models::{
    JobPosting, RouteDecisionResponse, StudentProfile, UpdateJobRequest, job_status,
};

fn posting() -> JobPosting {
    JobPosting {
        title: "Graduate Engineer".to_string(),
        min_cgpa: 7.0,
        branches: vec!["CSE".to_string(), "IT".to_string()],
        graduation_year: 2026,
        application_deadline: Utc::now() + Duration::days(7),
        status: job_status::ACTIVE.to_string(),
        ..JobPosting::default()
    }
}

fn profile() -> StudentProfile {
    StudentProfile {
        branch: "CSE".to_string(),
        cgpa: 8.0,
        graduation_year: 2026,
        active_backlogs: 0,
        ..StudentProfile::default()
    }
}

// --- Serde shapes ---

#[test]
fn test_role_serializes_to_canonical_tokens() {
    assert_eq!(serde_json::to_string(&Role::Student).unwrap(), r#""STUDENT""#);
    assert_eq!(
        serde_json::to_string(&Role::Recruiter).unwrap(),
        r#""RECRUITER""#
    );
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);

    let parsed: Role = serde_json::from_str(r#""RECRUITER""#).unwrap();
    assert_eq!(parsed, Role::Recruiter);
    // Serde deserialization is as strict as Role::parse.
    assert!(serde_json::from_str::<Role>(r#""recruiter""#).is_err());
}

#[test]
fn test_update_job_request_optionality() {
    // Confirms the structure supports partial updates (all fields are Option<T>).
    let partial_update = UpdateJobRequest {
        title: Some("New Title Only".to_string()),
        description: None,
        location: None,
        ctc_lpa: None,
        min_cgpa: None,
        application_deadline: None,
    };

    let json_output = serde_json::to_string(&partial_update).unwrap();
    assert!(json_output.contains(r#""title":"New Title Only""#));
    // None fields are omitted entirely.
    assert!(!json_output.contains("description"));
    assert!(!json_output.contains("ctc_lpa"));
}

#[test]
fn test_route_decision_response_shape() {
    let response = RouteDecisionResponse {
        decision: "DASHBOARD".to_string(),
        redirect: Some("/student".to_string()),
    };
    let json_output = serde_json::to_string(&response).unwrap();
    assert!(json_output.contains(r#""decision":"DASHBOARD""#));
    assert!(json_output.contains(r#""redirect":"/student""#));
}

// --- Posting lifecycle helpers ---

#[test]
fn test_is_open_requires_active_status_and_future_deadline() {
    let now = Utc::now();

    assert!(posting().is_open(now));

    let mut pending = posting();
    pending.status = job_status::PENDING_APPROVAL.to_string();
    assert!(!pending.is_open(now));

    let mut expired = posting();
    expired.application_deadline = now - Duration::hours(1);
    assert!(!expired.is_open(now));
}

// --- Eligibility ---

#[test]
fn test_eligibility_passes_for_matching_profile() {
    assert_eq!(posting().check_eligibility(&profile()), Ok(()));
}

#[test]
fn test_eligibility_reports_first_failing_criterion() {
    let job = posting();

    let mut low_cgpa = profile();
    low_cgpa.cgpa = 6.5;
    assert_eq!(
        job.check_eligibility(&low_cgpa),
        Err("CGPA below minimum requirement")
    );

    let mut wrong_branch = profile();
    wrong_branch.branch = "MECH".to_string();
    assert_eq!(
        job.check_eligibility(&wrong_branch),
        Err("Branch not eligible")
    );

    let mut wrong_year = profile();
    wrong_year.graduation_year = 2027;
    assert_eq!(
        job.check_eligibility(&wrong_year),
        Err("Graduation year mismatch")
    );

    let mut backlogs = profile();
    backlogs.active_backlogs = 2;
    assert_eq!(
        job.check_eligibility(&backlogs),
        Err("Active backlogs not allowed")
    );

    // CGPA is checked first, so a profile failing everything reports the CGPA.
    let mut hopeless = profile();
    hopeless.cgpa = 5.0;
    hopeless.branch = "MECH".to_string();
    hopeless.active_backlogs = 3;
    assert_eq!(
        job.check_eligibility(&hopeless),
        Err("CGPA below minimum requirement")
    );
}

#[test]
fn test_eligibility_boundary_cgpa_is_inclusive() {
    let job = posting();
    let mut exact = profile();
    exact.cgpa = 7.0;
    assert_eq!(job.check_eligibility(&exact), Ok(()));
}
