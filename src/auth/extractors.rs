use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::auth::guard::AuthContext;
use crate::errors::ApiError;

/// Reads the identity a gate middleware placed into request extensions.
/// A missing context means the route was wired without a gate, which is
/// a routing bug, not a client error.
#[derive(Debug)]
pub struct CurrentUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!(
                    "auth context missing from request extensions"
                ))
            })?;
        Ok(CurrentUser(ctx))
    }
}
