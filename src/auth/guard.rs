use axum::{
    extract::{FromRef, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::{Claims, JwtKeys};
use crate::auth::repo_types::Role;
use crate::errors::ApiError;
use crate::state::AppState;

/// Identity attached to the request once a gate has verified the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

pub const ADMIN: &[Role] = &[Role::Admin];
pub const ADMIN_OR_SUPERADMIN: &[Role] = &[Role::Admin, Role::SuperAdmin];

fn bearer_claims(state: &AppState, req: &Request) -> Result<Claims, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Token not provided or invalid format!".into()))?;

    let keys = JwtKeys::from_ref(state);
    keys.verify_access(token).map_err(|e| {
        warn!(error = %e, "access token rejected");
        ApiError::Unauthorized("Invalid token!".into())
    })
}

/// Verifies the bearer token without any role filter.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state, &req)?;
    req.extensions_mut().insert(AuthContext {
        user_id: claims.id,
        role: claims.role,
    });
    Ok(next.run(req).await)
}

/// Verifies the bearer token and requires the decoded role to be in the
/// allow-list. Each gate is self-contained; routes never rely on an
/// earlier middleware having run.
pub async fn require_role(
    allow: &'static [Role],
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state, &req)?;
    if !claims.role.allowed_by(allow) {
        warn!(user_id = %claims.id, role = ?claims.role, "role not allowed");
        return Err(ApiError::Forbidden("Not allowed!".into()));
    }
    req.extensions_mut().insert(AuthContext {
        user_id: claims.id,
        role: claims.role,
    });
    Ok(next.run(req).await)
}
