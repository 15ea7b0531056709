use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role. Stored as TEXT with the variant name verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
    Ceo,
}

impl Role {
    /// Membership test against a route allow-list.
    pub fn allowed_by(self, allow: &[Role]) -> bool {
        allow.contains(&self)
    }
}

/// Account activation state. New accounts start Inactive until the
/// one-time code is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum UserStatus {
    Inactive,
    Active,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub year_of_birth: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub phone: String,
    pub role: Role,
    pub status: UserStatus,
    pub avatar: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Projection returned by the admin listing endpoints.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub year_of_birth: i32,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub status: UserStatus,
    pub phone: String,
}
