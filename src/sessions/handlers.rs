use axum::{
    extract::State,
    middleware,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{dto::MessageResponse, extractors::CurrentUser, guard},
    errors::ApiError,
    sessions::repo::Session,
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/session", get(current_session).delete(delete_session))
        .route_layer(middleware::from_fn_with_state(state, guard::authenticate))
}

/// The caller's most recent login record.
#[instrument(skip(state))]
pub async fn current_session(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<Session>, ApiError> {
    let session = Session::current_for_user(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found!".into()))?;
    Ok(Json(session))
}

/// Remove the caller's most recent login record only.
#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    if !Session::delete_current(&state.db, ctx.user_id).await? {
        return Err(ApiError::NotFound("Session not found!".into()));
    }

    info!(user_id = %ctx.user_id, "current session deleted");
    Ok(Json(MessageResponse {
        message: "Session deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request as HttpRequest, StatusCode},
    };
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        router(state.clone()).with_state(state)
    }

    #[tokio::test]
    async fn session_routes_require_a_token() {
        for method in [Method::GET, Method::DELETE] {
            let res = app(AppState::fake())
                .oneshot(
                    HttpRequest::builder()
                        .method(method.clone())
                        .uri("/session")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{method} /session");
        }
    }

    #[tokio::test]
    async fn refresh_tokens_cannot_read_sessions() {
        use crate::auth::{jwt::JwtKeys, repo_types::Role};
        use axum::extract::FromRef;
        use uuid::Uuid;

        let state = AppState::fake();
        let refresh = JwtKeys::from_ref(&state)
            .sign_refresh(Uuid::new_v4(), Role::User)
            .unwrap();
        let res = app(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/session")
                    .header("Authorization", format!("Bearer {refresh}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
