use sqlx::PgPool;
use uuid::Uuid;

use crate::products::dto::{ListProductsQuery, UpdateProductRequest};
use crate::products::repo_types::{Product, ProductRow, ProductWithCategory};
use crate::validation::SortOrder;

const JOINED_COLUMNS: &str = "p.id, p.name, p.price, p.category_id, p.created_at, \
     c.name AS category_name, c.created_at AS category_created_at";

impl Product {
    /// Insert a product. A dangling category id trips the foreign key and
    /// propagates as an error.
    pub async fn create(
        db: &PgPool,
        name: &str,
        price: f64,
        category_id: Uuid,
    ) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price, category_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, category_id, created_at
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(category_id)
        .fetch_one(db)
        .await?;
        Ok(product)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, price, category_id, created_at FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    pub async fn find_with_category(
        db: &PgPool,
        id: Uuid,
    ) -> anyhow::Result<Option<ProductWithCategory>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row.map(ProductWithCategory::from))
    }

    /// Page through products with their categories embedded.
    pub async fn list(
        db: &PgPool,
        query: &ListProductsQuery,
    ) -> anyhow::Result<Vec<ProductWithCategory>> {
        let column = query.sort_by.map_or("p.name", |s| s.column());
        let order = query.sort_order.unwrap_or(SortOrder::Asc).keyword();
        let offset = (query.page - 1) * query.limit;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE ($1::uuid IS NULL OR p.category_id = $1)
              AND ($2::float8 IS NULL OR p.price >= $2)
              AND ($3::float8 IS NULL OR p.price <= $3)
              AND ($4::text IS NULL OR p.name ILIKE '%' || $4 || '%')
            ORDER BY {column} {order}
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(query.category_id)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(&query.search)
        .bind(query.limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(ProductWithCategory::from).collect())
    }

    /// Apply a partial update; absent fields keep their stored value.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        payload: &UpdateProductRequest,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET name        = COALESCE($2, name),
                price       = COALESCE($3, price),
                category_id = COALESCE($4, category_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(payload.price)
        .bind(payload.category_id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
