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
    categories::repo::Category,
    errors::ApiError,
    products::{
        dto::{CreateProductRequest, ListProductsQuery, UpdateProductRequest},
        repo_types::{Product, ProductWithCategory},
    },
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
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product))
        .route("/products/:id", put(update_product).layer(admin_or_superadmin))
        .route("/products/:id", delete(delete_product).layer(admin))
}

fn check<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(first_violation(&e)))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    check(&payload)?;

    let (name, price, category_id) = match (
        payload.name.as_deref().filter(|n| !n.is_empty()),
        payload.price,
        payload.category_id,
    ) {
        (Some(name), Some(price), Some(category_id)) => (name, price, category_id),
        _ => {
            return Err(ApiError::BadRequest(
                "Name, price and categoryId are required!".into(),
            ))
        }
    };

    let product = Product::create(&state.db, name, price, category_id).await?;

    info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(mut query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductWithCategory>>, ApiError> {
    if query.page < 1 {
        query.page = 1;
    }
    if query.limit < 1 {
        query.limit = 10;
    }
    let products = Product::list(&state.db, &query).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductWithCategory>, ApiError> {
    let product = Product::find_with_category(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    Ok(Json(product))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductWithCategory>, ApiError> {
    check(&payload)?;

    if Product::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found!".into()));
    }

    if let Some(category_id) = payload.category_id {
        if Category::find_by_id(&state.db, category_id).await?.is_none() {
            return Err(ApiError::BadRequest("Category does not exist!".into()));
        }
    }

    Product::update(&state.db, id, &payload).await?;
    let product = Product::find_with_category(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found!".into()))?;

    info!(product_id = %product.id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if Product::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found!".into()));
    }

    Product::delete(&state.db, id).await?;

    info!(product_id = %id, "product deleted");
    Ok(Json(MessageResponse {
        message: "Product deleted successfully!".into(),
    }))
}
