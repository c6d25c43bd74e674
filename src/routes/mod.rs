/// Router Module Index
///
/// Organizes the application's routing logic into role-segregated modules,
/// mirroring the client's route groups. Access control is applied explicitly at
/// the module level (via Axum layers running the access core), preventing
/// accidental exposure of protected endpoints.
///
/// Each role-owned module corresponds to an entry in `access::ROUTE_RULES`;
/// the `/auth` group is session-guarded only, since role selection lives there.

/// Routes accessible to any client (anonymous or signed-in): health, the
/// route-decision endpoint, and the dashboard redirect.
pub mod public;

/// Routes under `/auth`, open to any authenticated principal (role not yet
/// required): own profile and the role-selection write-back.
pub mod auth;

/// Routes under `/student`, restricted to `Role::Student`.
pub mod student;

/// Routes under `/recruiter`, restricted to `Role::Recruiter`.
pub mod recruiter;

/// Routes under `/admin`, restricted to `Role::Admin`.
pub mod admin;
