use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{dto::MessageResponse, guard},
    categories::{
        dto::{CreateCategoryRequest, ListCategoriesQuery, UpdateCategoryRequest},
        repo::Category,
    },
    errors::ApiError,
    state::AppState,
    validation::first_violation,
};

pub fn router(state: AppState) -> Router<AppState> {
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

    Router::new()
        .route("/category", get(list_categories).post(create_category))
        .route("/category/:id", get(get_category))
        .route("/category/:id", put(update_category).layer(admin_or_superadmin))
        .route("/category/:id", delete(delete_category).layer(admin))
}

/// Catalog payloads answer 400 on schema violations, not 422.
fn check<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(first_violation(&e)))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    check(&payload)?;
    let name = payload
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Name is required!".into()))?;

    let category = Category::create(&state.db, name).await?;

    info!(category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(mut query): Query<ListCategoriesQuery>,
) -> Result<Json<Vec<Category>>, ApiError> {
    if query.page < 1 {
        query.page = 1;
    }
    if query.limit < 1 {
        query.limit = 10;
    }
    let categories = Category::list(&state.db, &query).await?;
    Ok(Json(categories))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    let category = Category::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found!".into()))?;
    Ok(Json(category))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    check(&payload)?;
    let name = payload
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Name is required!".into()))?;

    let category = Category::update(&state.db, id, name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found!".into()))?;

    info!(category_id = %category.id, "category updated");
    Ok(Json(category))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !Category::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Category not found!".into()));
    }

    info!(category_id = %id, "category deleted");
    Ok(Json(MessageResponse {
        message: "Category deleted successfully".into(),
    }))
}
