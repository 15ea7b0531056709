use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::dto::ListCategoriesQuery;
use crate::validation::SortOrder;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Category {
    pub async fn create(db: &PgPool, name: &str) -> anyhow::Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(db)
        .await?;
        Ok(category)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(category)
    }

    /// Page through categories, name-sorted, optionally filtered by a
    /// case-insensitive substring.
    pub async fn list(db: &PgPool, query: &ListCategoriesQuery) -> anyhow::Result<Vec<Category>> {
        let order = query.sort_order.unwrap_or(SortOrder::Asc).keyword();
        let offset = (query.page - 1) * query.limit;

        let categories = sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT id, name, created_at
            FROM categories
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
            ORDER BY name {order}
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&query.search)
        .bind(query.limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(categories)
    }

    /// Rename a category. None when no row matched.
    pub async fn update(db: &PgPool, id: Uuid, name: &str) -> anyhow::Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2
            WHERE id = $1
            RETURNING id, name, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(category)
    }

    /// Delete a category. A foreign-key violation from attached products
    /// propagates as an error.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_camel_case() {
        let category = Category {
            id: Uuid::new_v4(),
            name: "Drinks".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&category).unwrap();
        assert!(json.contains("\"name\":\"Drinks\""));
        assert!(json.contains("\"createdAt\""));
    }
}
