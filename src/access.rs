use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::config::Env;

// --- Canonical client paths ---

// These are the paths the React client mounts; the backend emits them as redirect
// targets so client and server navigation stay in sync.
pub const SIGN_IN_PATH: &str = "/sign-in";
pub const ROLE_SELECTION_PATH: &str = "/role-selection";
pub const ROOT_PATH: &str = "/";
pub const STUDENT_DASHBOARD_PATH: &str = "/student";
pub const RECRUITER_DASHBOARD_PATH: &str = "/recruiter";
pub const ADMIN_DASHBOARD_PATH: &str = "/admin";

/// Role
///
/// The three actor kinds of the portal. The wire form is the canonical uppercase
/// token (`STUDENT`, `RECRUITER`, `ADMIN`) as stored in the auth provider's
/// metadata and in the `users.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Student,
    Recruiter,
    Admin,
}

impl Role {
    /// parse
    ///
    /// The single conversion point from an untrusted role string to a typed `Role`.
    /// Anything other than a canonical token normalizes to `None` (fail-closed), so a
    /// malformed or tampered metadata value can never widen access.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "STUDENT" => Some(Role::Student),
            "RECRUITER" => Some(Role::Recruiter),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Canonical wire token for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Recruiter => "RECRUITER",
            Role::Admin => "ADMIN",
        }
    }
}

/// Principal
///
/// Snapshot of the auth provider's session state for one request or navigation.
/// `loaded` transitions false→true once during session bootstrap; `authenticated`
/// is set at session start and cleared at sign-out. Both role fields hold values
/// that already passed `Role::parse`, so the unknown-shape risk stays at the boundary.
///
/// The fallback role is carried as explicit data rather than read from ambient
/// storage inside the resolver, so every resolution is a pure function of its inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Principal {
    pub loaded: bool,
    pub authenticated: bool,
    pub primary_role: Option<Role>,
    pub fallback_role: Option<Role>,
}

/// SessionStatus
///
/// Output of the Session Resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The auth provider has not finished bootstrapping. No access rule may be
    /// evaluated in this state.
    Loading,
    Unauthenticated,
    Authenticated,
}

/// resolve_session
///
/// Projects a principal onto its session status. Pure; no side effects.
pub fn resolve_session(principal: &Principal) -> SessionStatus {
    if !principal.loaded {
        SessionStatus::Loading
    } else if !principal.authenticated {
        SessionStatus::Unauthenticated
    } else {
        SessionStatus::Authenticated
    }
}

/// resolve_role
///
/// Determines the effective role for access decisions. The primary (provider-
/// assigned) role always wins. The fallback role is a development aid and is
/// consulted only under `Env::Local`; in production it is ignored entirely, so a
/// leaked dev header can never grant a role.
pub fn resolve_role(principal: &Principal, env: &Env) -> Option<Role> {
    match principal.primary_role {
        Some(role) => Some(role),
        None if *env == Env::Local => principal.fallback_role,
        None => None,
    }
}

/// RouteAccess
///
/// Who may enter a route group: any signed-in principal with a role, or only the
/// listed roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    AnyAuthenticated,
    Roles(&'static [Role]),
}

/// RouteRule
///
/// Static declaration of which roles may access a path prefix. Rules are fixed at
/// compile time and never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: &'static str,
    pub access: RouteAccess,
}

/// Named rules for each guarded group. The guard layers reference these directly;
/// [`ROUTE_RULES`] aggregates them for path lookup.
pub const DASHBOARD_RULE: RouteRule = RouteRule {
    prefix: "/dashboard",
    access: RouteAccess::AnyAuthenticated,
};
pub const STUDENT_RULE: RouteRule = RouteRule {
    prefix: STUDENT_DASHBOARD_PATH,
    access: RouteAccess::Roles(&[Role::Student]),
};
pub const RECRUITER_RULE: RouteRule = RouteRule {
    prefix: RECRUITER_DASHBOARD_PATH,
    access: RouteAccess::Roles(&[Role::Recruiter]),
};
pub const ADMIN_RULE: RouteRule = RouteRule {
    prefix: ADMIN_DASHBOARD_PATH,
    access: RouteAccess::Roles(&[Role::Admin]),
};

/// ROUTE_RULES
///
/// The complete guarded-route table, mirroring the client's route groups. Paths
/// that match no rule are public. Role selection itself is deliberately absent:
/// a rule here would send the role-less user to the page they are already on.
pub const ROUTE_RULES: &[RouteRule] = &[
    DASHBOARD_RULE,
    STUDENT_RULE,
    RECRUITER_RULE,
    ADMIN_RULE,
];

/// rule_for
///
/// Longest-prefix lookup into [`ROUTE_RULES`]. A prefix matches the exact path or
/// any sub-path (`/student` matches `/student` and `/student/jobs/42`, not
/// `/students`).
pub fn rule_for(path: &str) -> Option<&'static RouteRule> {
    ROUTE_RULES
        .iter()
        .filter(|rule| {
            path == rule.prefix
                || (path.starts_with(rule.prefix)
                    && path.as_bytes().get(rule.prefix.len()) == Some(&b'/'))
        })
        .max_by_key(|rule| rule.prefix.len())
}

/// Decision
///
/// Outcome of the Access Guard for one navigation attempt. Computed fresh per
/// navigation; never cached across principal changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToSignIn,
    RedirectToRoleSelection,
    RedirectToDashboard(Role),
}

/// decide
///
/// The Access Guard. Evaluated in order, first match wins:
///
/// 1. session still loading → `None` (hold; no Decision exists yet, the caller
///    re-evaluates when the provider finishes loading).
/// 2. unauthenticated → redirect to sign-in.
/// 3. authenticated but no effective role → redirect to role selection.
/// 4. role present but excluded by the rule → redirect to the role's own dashboard.
/// 5. otherwise → allow.
///
/// Authentication is resolved before role (a signed-out caller has no meaningful
/// role), and missing-role before role-mismatch ("never chose a role" and "chose
/// the wrong one" route differently).
pub fn decide(
    session: SessionStatus,
    role: Option<Role>,
    rule: &RouteRule,
) -> Option<Decision> {
    match session {
        SessionStatus::Loading => return None,
        SessionStatus::Unauthenticated => return Some(Decision::RedirectToSignIn),
        SessionStatus::Authenticated => {}
    }

    let Some(role) = role else {
        return Some(Decision::RedirectToRoleSelection);
    };

    match rule.access {
        RouteAccess::AnyAuthenticated => Some(Decision::Allow),
        RouteAccess::Roles(allowed) => {
            if allowed.contains(&role) {
                Some(Decision::Allow)
            } else {
                Some(Decision::RedirectToDashboard(role))
            }
        }
    }
}

/// dashboard_path
///
/// Maps a resolved role to its canonical landing path. This function is the single
/// source of truth for the mapping: the Access Guard's redirect target and the
/// post-sign-in `/dashboard` redirect both call it. A missing role lands on the
/// application root.
pub fn dashboard_path(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Student) => STUDENT_DASHBOARD_PATH,
        Some(Role::Recruiter) => RECRUITER_DASHBOARD_PATH,
        Some(Role::Admin) => ADMIN_DASHBOARD_PATH,
        None => ROOT_PATH,
    }
}

/// redirect_target
///
/// The client path a non-`Allow` decision points at. `Allow` has no target.
pub fn redirect_target(decision: Decision) -> Option<&'static str> {
    match decision {
        Decision::Allow => None,
        Decision::RedirectToSignIn => Some(SIGN_IN_PATH),
        Decision::RedirectToRoleSelection => Some(ROLE_SELECTION_PATH),
        Decision::RedirectToDashboard(role) => Some(dashboard_path(Some(role))),
    }
}
