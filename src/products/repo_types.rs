use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::repo::Category;

/// Product row as stored. Creation responses use this bare shape.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub category_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Flat join row coming back from the category join.
#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub category_id: Uuid,
    pub created_at: OffsetDateTime,
    pub category_name: String,
    pub category_created_at: OffsetDateTime,
}

/// Read-side shape: the product with its category embedded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithCategory {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub category_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub category: Category,
}

impl From<ProductRow> for ProductWithCategory {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            price: r.price,
            category_id: r.category_id,
            created_at: r.created_at,
            category: Category {
                id: r.category_id,
                name: r.category_name,
                created_at: r.category_created_at,
            },
        }
    }
}
