use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::dto::{ListUsersQuery, RegisterRequest, UpdateUserRequest};
use crate::auth::repo_types::{Role, User, UserStatus, UserSummary};
use crate::validation::SortOrder;

const USER_COLUMNS: &str = "id, full_name, year_of_birth, email, password_hash, phone, role, status, avatar, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "id, full_name, year_of_birth, email, role, avatar, status, phone";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Fetch the listing projection for a single user.
    pub async fn find_summary_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<UserSummary>> {
        let user = sqlx::query_as::<_, UserSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. Accounts start Inactive.
    pub async fn create(
        db: &PgPool,
        payload: &RegisterRequest,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (full_name, year_of_birth, email, password_hash, phone, role, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&payload.full_name)
        .bind(payload.year_of_birth)
        .bind(&payload.email)
        .bind(password_hash)
        .bind(&payload.phone)
        .bind(payload.role.unwrap_or(Role::User))
        .bind(&payload.avatar)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Flip the activation state.
    pub async fn set_status(db: &PgPool, id: Uuid, status: UserStatus) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Change a user's role. Returns false when no row matched.
    pub async fn set_role(db: &PgPool, id: Uuid, role: Role) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a partial update; absent fields keep their stored value.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        payload: &UpdateUserRequest,
        password_hash: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET full_name     = COALESCE($2, full_name),
                year_of_birth = COALESCE($3, year_of_birth),
                email         = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                phone         = COALESCE($6, phone),
                role          = COALESCE($7, role),
                status        = COALESCE($8, status),
                avatar        = COALESCE($9, avatar),
                updated_at    = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&payload.full_name)
        .bind(payload.year_of_birth)
        .bind(&payload.email)
        .bind(password_hash)
        .bind(&payload.phone)
        .bind(payload.role)
        .bind(payload.status)
        .bind(&payload.avatar)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Delete a user. Returns false when no row matched.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Page through users matching the optional filters. The search term
    /// matches full name or email, case-sensitively.
    pub async fn list(db: &PgPool, query: &ListUsersQuery) -> anyhow::Result<Vec<UserSummary>> {
        let column = query.sort_by.map_or("created_at", |s| s.column());
        let order = query.sort_order.unwrap_or(SortOrder::Desc).keyword();
        let offset = (query.page - 1) * query.limit;

        let users = sqlx::query_as::<_, UserSummary>(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS}
            FROM users
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR role = $2)
              AND ($3::text IS NULL
                   OR full_name LIKE '%' || $3 || '%'
                   OR email LIKE '%' || $3 || '%')
            ORDER BY {column} {order}
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(query.status)
        .bind(query.role)
        .bind(&query.search)
        .bind(query.limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Count users matching the same filters as `list`.
    pub async fn count(db: &PgPool, query: &ListUsersQuery) -> anyhow::Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR role = $2)
              AND ($3::text IS NULL
                   OR full_name LIKE '%' || $3 || '%'
                   OR email LIKE '%' || $3 || '%')
            "#,
        )
        .bind(query.status)
        .bind(query.role)
        .bind(&query.search)
        .fetch_one(db)
        .await?;
        Ok(total)
    }
}
