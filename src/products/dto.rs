use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{default_limit, default_page, validate_price, SortOrder, NAME_RE};

/// All fields optional at the schema level; create enforces presence in
/// the handler so the message matches the one clients expect.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(
        length(min = 2, max = 100, message = "Name must be at least 2 characters"),
        regex(
            path = *NAME_RE,
            message = "Name can only contain letters, numbers, spaces, apostrophes (') and hyphens (-)"
        )
    )]
    pub name: Option<String>,
    #[validate(custom(function = validate_price))]
    pub price: Option<f64>,
    pub category_id: Option<Uuid>,
}

pub type UpdateProductRequest = CreateProductRequest;

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum ProductSortBy {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "categoryId")]
    CategoryId,
}

impl ProductSortBy {
    pub fn column(self) -> &'static str {
        match self {
            ProductSortBy::Name => "p.name",
            ProductSortBy::Price => "p.price",
            ProductSortBy::CategoryId => "p.category_id",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub category_id: Option<Uuid>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
