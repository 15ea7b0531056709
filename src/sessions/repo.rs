use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One login event. Rows are append-only; the newest row per user is the
/// "current" session.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip_address: String,
    pub device_info: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Session {
    /// Append a login row. Prior rows for the user are left untouched.
    pub async fn record(
        db: &PgPool,
        user_id: Uuid,
        ip_address: &str,
        device_info: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (user_id, ip_address, device_info)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(ip_address)
        .bind(device_info)
        .execute(db)
        .await?;
        Ok(())
    }

    /// The user's most recent login, if any.
    pub async fn current_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, ip_address, device_info, created_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(session)
    }

    /// Delete exactly the user's most recent login row. Returns false when
    /// the user has no sessions at all.
    pub async fn delete_current(db: &PgPool, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = (
                SELECT id FROM sessions
                WHERE user_id = $1
                ORDER BY created_at DESC
                LIMIT 1
            )
            "#,
        )
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_serializes_camel_case() {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            ip_address: "127.0.0.1".into(),
            device_info: Some("Mozilla/5.0".into()),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"ipAddress\""));
        assert!(json.contains("\"deviceInfo\""));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn absent_device_serializes_as_null() {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            ip_address: "10.0.0.1".into(),
            device_info: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"deviceInfo\":null"));
    }
}
