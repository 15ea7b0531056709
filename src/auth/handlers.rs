use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, Path, Query, Request, State},
    http::header::USER_AGENT,
    http::HeaderMap,
    middleware::{self, Next},
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{
        dto::{
            AccessTokenResponse, ListUsersQuery, LoginRequest, LoginResponse, MessageResponse,
            RefreshRequest, RegisterRequest, UpdateUserRequest, UserDataResponse, UserListResponse,
            UserResponse, VerifyOtpRequest,
        },
        extractors::CurrentUser,
        guard,
        jwt::JwtKeys,
        otp::Totp,
        password::{hash_password, verify_password},
        repo_types::{Role, User, UserStatus},
    },
    errors::{is_unique_violation, ApiError},
    sessions::repo::Session,
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    let bearer = middleware::from_fn_with_state(state.clone(), guard::authenticate);
    let admin = middleware::from_fn_with_state(
        state.clone(),
        |s: State<AppState>, req: Request, next: Next| guard::require_role(guard::ADMIN, s, req, next),
    );
    let admin_or_superadmin = middleware::from_fn_with_state(
        state,
        |s: State<AppState>, req: Request, next: Next| {
            guard::require_role(guard::ADMIN_OR_SUPERADMIN, s, req, next)
        },
    );

    // Same-path routes merge per method, so each verb keeps its own gate.
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/login", post(login))
        .route("/auth/get-access-token", post(get_access_token))
        .route(
            "/auth/promoteToAdmin/:id",
            patch(promote_to_admin).layer(bearer),
        )
        .route("/auth", get(list_users).layer(admin.clone()))
        .route("/auth/", get(list_users).layer(admin.clone()))
        .route("/auth/:id", get(get_user).layer(admin.clone()))
        .route("/auth/:id", patch(update_user).layer(admin_or_superadmin))
        .route("/auth/:id", delete(delete_user).layer(admin))
}

/// Create an Inactive account and dispatch its activation code. The
/// duplicate check runs before schema validation, matching the contract
/// earlier clients were built against.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "register duplicate email");
        return Err(ApiError::Conflict("This account already exists".into()));
    }

    payload.validate()?;

    let hash = hash_password(&payload.password)?;
    let user = match User::create(&state.db, &payload, &hash).await {
        Ok(u) => u,
        // Lost the race with a concurrent registration for the same email.
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "register duplicate email");
            return Err(ApiError::Conflict("This account already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let code = Totp::from_ref(&state).generate(&user.email)?;
    if let Err(e) = state.notifier.send_one_time_code(&user.email, &code).await {
        // The row is committed at this point; the client sees a 500 and
        // the account stays Inactive until a code can be delivered.
        warn!(user_id = %user.id, "account created but code dispatch failed");
        return Err(ApiError::Internal(e));
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(UserResponse {
        message: "Registered successfully. We sent OTP to your email for activation".into(),
        data: user,
    }))
}

/// Activate an account by checking the emailed one-time code.
#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::Conflict("Email is incorrect".into()))?;

    if !Totp::from_ref(&state).verify(&user.email, &payload.otp)? {
        warn!(user_id = %user.id, "one-time code mismatch");
        return Err(ApiError::InvalidOtp);
    }

    if user.status == UserStatus::Inactive {
        User::set_status(&state.db, user.id, UserStatus::Active).await?;
    }

    info!(user_id = %user.id, "account activated");
    Ok(Json(MessageResponse {
        message: "Your account has been activated successfully".into(),
    }))
}

/// Check credentials, mint the token pair and record the login session.
#[instrument(skip(state, headers, payload))]
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, user.role)?;
    let refresh_token = keys.sign_refresh(user.id, user.role)?;

    let device = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Session::record(&state.db, user.id, &addr.ip().to_string(), device.as_deref()).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
    }))
}

/// Trade a refresh token for a fresh access token. The refresh token is
/// not rotated.
#[instrument(skip(state, payload))]
pub async fn get_access_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        ApiError::BadRequest("Invalid refresh token".into())
    })?;

    let user = User::find_by_id(&state.db, claims.id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid refresh token".into()))?;

    let access_token = keys.sign_access(user.id, user.role)?;

    info!(user_id = %user.id, "access token refreshed");
    Ok(Json(AccessTokenResponse {
        message: "New access token generated successfully".into(),
        access_token,
    }))
}

/// Grant the Admin role to the given user. Any authenticated caller may
/// do this; the route carries no role filter.
#[instrument(skip(state))]
pub async fn promote_to_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !User::set_role(&state.db, id, Role::Admin).await? {
        return Err(ApiError::BadRequest("Something went wrong".into()));
    }

    info!(user_id = %id, "user promoted to admin");
    Ok(Json(MessageResponse {
        message: "Updated successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(mut query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    // The route gate already filters for Admin; kept as a second check so
    // the handler stands on its own.
    if ctx.role != Role::Admin {
        return Err(ApiError::Forbidden("You are not allowed".into()));
    }

    if query.page < 1 {
        query.page = 1;
    }
    if query.limit < 1 {
        query.limit = 10;
    }

    let data = User::list(&state.db, &query).await?;
    let total = User::count(&state.db, &query).await?;

    Ok(Json(UserListResponse {
        total,
        page: query.page,
        total_pages: total_pages(total, query.limit),
        data,
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDataResponse>, ApiError> {
    let data = User::find_summary_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(UserDataResponse { data }))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate()?;

    if !ctx.role.allowed_by(guard::ADMIN_OR_SUPERADMIN) {
        return Err(ApiError::Forbidden(
            "Only SuperAdmin and Admin can update User".into(),
        ));
    }

    let password_hash = match payload.password.as_deref() {
        Some(plain) => Some(hash_password(plain)?),
        None => None,
    };

    let user = User::update(&state.db, id, &payload, password_hash.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(UserResponse {
        message: "User updated successfully".into(),
        data: user,
    }))
}

/// Delete a user. Admin targets are untouchable, and only accounts still
/// holding the plain User role may be removed.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = User::find_summary_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if target.role == Role::Admin {
        return Err(ApiError::Forbidden("Nobody can destroy admin".into()));
    }
    if target.role != Role::User {
        return Err(ApiError::Forbidden("Only User can be deleted".into()));
    }

    User::delete(&state.db, id).await?;

    info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully".into(),
    }))
}

fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::guard::AuthContext;
    use axum::{
        body::Body,
        http::{Method, Request as HttpRequest, StatusCode},
    };
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        router(state.clone()).with_state(state)
    }

    fn request(method: Method, path: &str, token: Option<&str>) -> HttpRequest<Body> {
        let builder = HttpRequest::builder().method(method).uri(path);
        let builder = match token {
            Some(t) => builder.header("Authorization", format!("Bearer {t}")),
            None => builder,
        };
        builder.body(Body::empty()).unwrap()
    }

    fn empty_update() -> UpdateUserRequest {
        UpdateUserRequest {
            full_name: None,
            year_of_birth: None,
            email: None,
            password: None,
            phone: None,
            role: None,
            status: None,
            avatar: None,
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(35, 10), 4);
    }

    #[tokio::test]
    async fn listing_requires_a_token() {
        let res = app(AppState::fake())
            .oneshot(request(Method::GET, "/auth", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn listing_rejects_plain_users() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4(), Role::User)
            .unwrap();
        let res = app(state)
            .oneshot(request(Method::GET, "/auth/", Some(&token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn promote_requires_a_token() {
        let id = Uuid::new_v4();
        let res = app(AppState::fake())
            .oneshot(request(
                Method::PATCH,
                &format!("/auth/promoteToAdmin/{id}"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn delete_gate_excludes_superadmin() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4(), Role::SuperAdmin)
            .unwrap();
        let id = Uuid::new_v4();
        let res = app(state)
            .oneshot(request(Method::DELETE, &format!("/auth/{id}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn register_endpoints_are_open() {
        // No token at all must still reach the handler, not a gate.
        let res = app(AppState::fake())
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_ne!(res.status(), StatusCode::UNAUTHORIZED);
        assert_ne!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn in_handler_listing_check_stands_alone() {
        let state = AppState::fake();
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            role: Role::SuperAdmin,
        };
        let query: ListUsersQuery = serde_json::from_str("{}").unwrap();
        let err = list_users(State(state), CurrentUser(ctx), Query(query))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(m) if m == "You are not allowed"));
    }

    #[tokio::test]
    async fn update_rejects_callers_below_admin() {
        let state = AppState::fake();
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            role: Role::User,
        };
        let err = update_user(
            State(state),
            CurrentUser(ctx),
            Path(Uuid::new_v4()),
            Json(empty_update()),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, ApiError::Forbidden(m) if m == "Only SuperAdmin and Admin can update User")
        );
    }

    #[tokio::test]
    async fn update_validates_before_touching_the_store() {
        let state = AppState::fake();
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let payload = UpdateUserRequest {
            password: Some("short".into()),
            ..empty_update()
        };
        let err = update_user(State(state), CurrentUser(ctx), Path(Uuid::new_v4()), Json(payload))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::Validation(m) if m == "Password must be at least 6 characters")
        );
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_tokens() {
        let state = AppState::fake();
        let err = get_access_token(
            State(state),
            Json(RefreshRequest {
                refresh_token: "not.a.jwt".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Invalid refresh token"));
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let state = AppState::fake();
        let access = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4(), Role::User)
            .unwrap();
        let err = get_access_token(
            State(state),
            Json(RefreshRequest {
                refresh_token: access,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Invalid refresh token"));
    }
}
