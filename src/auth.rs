use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::{
    access::{Principal, Role, resolve_role},
    config::{AppConfig, Env},
    models::User,
    repository::RepositoryState,
};

/// Claims
///
/// Represents the standard payload structure expected inside a JSON Web Token (JWT)
/// issued by the external auth provider. These claims are signed with the provider's
/// secret and validated upon every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The UUID of the user, synchronized with `public.users.id`.
    pub sub: Uuid,
    /// Expiration Time (exp): Timestamp after which the JWT must not be accepted.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the JWT was issued.
    pub iat: usize,
    /// Primary email claim, used to mirror the account on first touch.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name claim, used to mirror the account on first touch.
    #[serde(default)]
    pub name: Option<String>,
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers use this struct to
/// retrieve the user's ID, typed role, and approval state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user.
    pub id: Uuid,
    /// The effective role after primary/fallback resolution, or `None` when the
    /// user has not completed role selection.
    pub role: Option<Role>,
    /// TPO account approval flag.
    pub is_approved: bool,
}

/// CurrentPrincipal
///
/// Non-rejecting companion to [`AuthUser`]: projects the request into the access
/// core's [`Principal`] without ever failing the request. Guard layers and the
/// route-decision endpoint use it so that unauthenticated callers flow into the
/// Access Guard (which answers with the sign-in redirect) instead of being
/// rejected before a decision exists.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

/// dev_fallback_role
///
/// Reads the `x-dev-role` header into a fallback role. Only consulted under
/// `Env::Local`; in production the header is not even read, so the fallback can
/// never influence a production decision.
fn dev_fallback_role(parts: &Parts, config: &AppConfig) -> Option<Role> {
    if config.env != Env::Local {
        return None;
    }
    parts
        .headers
        .get("x-dev-role")
        .and_then(|value| value.to_str().ok())
        .and_then(Role::parse)
}

/// resolve_user
///
/// Shared authentication flow for both extractors:
/// 1. Local Development Bypass: under `Env::Local`, a known user UUID in the
///    `x-user-id` header authenticates directly (still verified against the
///    repository so roles are correctly loaded).
/// 2. Token Validation: standard Bearer extraction and JWT decoding with
///    expiration checking.
/// 3. Account Mirroring: the user row is fetched by the token subject; on first
///    authenticated touch the account is created from the token's identity claims.
///
/// Returns `None` on any failure; the caller chooses between rejecting (AuthUser)
/// and degrading to an unauthenticated principal (CurrentPrincipal).
async fn resolve_user(parts: &Parts, repo: &RepositoryState, config: &AppConfig) -> Option<User> {
    // 1. Local Development Bypass Check
    if config.env == Env::Local {
        if let Some(user_id_header) = parts.headers.get("x-user-id") {
            if let Ok(id_str) = user_id_header.to_str() {
                if let Ok(user_id) = Uuid::parse_str(id_str) {
                    if let Some(user) = repo.get_user(user_id).await {
                        return Some(user);
                    }
                }
            }
        }
    }
    // If Env is Production, or if the bypass failed, execution falls through to the
    // standard JWT validation flow.

    // 2. Token Extraction
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;

    // 3. JWT Decoding Setup
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active.
    validation.validate_exp = true;

    let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => data,
        Err(e) => {
            match e.kind() {
                // Expiry is the common failure for a valid-but-old token; worth a
                // debug line. Bad signatures and malformed tokens fail silently.
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired bearer token"),
                _ => {}
            }
            return None;
        }
    };

    let claims = token_data.claims;

    // 4. Account Lookup / First-Touch Mirroring
    // The token is cryptographically valid at this point; if the account has not
    // been mirrored yet, create it from the identity claims with no role set.
    match repo.get_user(claims.sub).await {
        Some(user) => Some(user),
        None => Some(
            repo.create_user(User {
                id: claims.sub,
                email: claims.email.unwrap_or_default(),
                full_name: claims.name.unwrap_or_default(),
                role: None,
                is_approved: false,
                created_at: Utc::now(),
            })
            .await,
        ),
    }
}

/// principal_from_user
///
/// Builds the access core's [`Principal`] from an optional resolved account.
/// `loaded` is always true server-side: by the time a request reaches us, the auth
/// provider has either produced a verifiable token or it hasn't.
fn principal_from_user(user: Option<&User>, fallback_role: Option<Role>) -> Principal {
    match user {
        Some(user) => Principal {
            loaded: true,
            authenticated: true,
            // The single boundary parse: a malformed stored role degrades to None.
            primary_role: user.role.as_deref().and_then(Role::parse),
            fallback_role,
        },
        None => Principal {
            loaded: true,
            authenticated: false,
            primary_role: None,
            fallback_role,
        },
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler. Authentication (extractor) stays cleanly
/// separated from business logic (the handler).
///
/// Rejection: Returns StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let user = resolve_user(parts, &repo, &config)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let fallback_role = dev_fallback_role(parts, &config);
        let principal = principal_from_user(Some(&user), fallback_role);

        Ok(AuthUser {
            id: user.id,
            role: resolve_role(&principal, &config.env),
            is_approved: user.is_approved,
        })
    }
}

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let user = resolve_user(parts, &repo, &config).await;
        let fallback_role = dev_fallback_role(parts, &config);

        Ok(CurrentPrincipal(principal_from_user(
            user.as_ref(),
            fallback_role,
        )))
    }
}
