use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::repo_types::{Role, User, UserStatus, UserSummary};
use crate::validation::{
    default_limit, default_page, validate_year_of_birth, SortOrder, NAME_RE, PHONE_RE,
};

/// Request body for registration. Accounts always start Inactive; only
/// the one-time code flow can activate them.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        length(min = 2, max = 100, message = "Full name must be at least 2 characters"),
        regex(
            path = *NAME_RE,
            message = "Full name can only contain letters, numbers, spaces, apostrophes (') and hyphens (-)"
        )
    )]
    pub full_name: String,
    #[validate(custom(function = validate_year_of_birth))]
    pub year_of_birth: i32,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(regex(path = *PHONE_RE, message = "Phone must be a valid phone number"))]
    pub phone: String,
    pub role: Option<Role>,
    #[validate(length(max = 500, message = "Avatar must be at most 500 characters"))]
    pub avatar: Option<String>,
}

/// Request body for account activation.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for minting a new access token. The field is snake_case
/// on the wire, unlike the rest of the surface.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 2, max = 100, message = "Full name must be at least 2 characters"),
        regex(
            path = *NAME_RE,
            message = "Full name can only contain letters, numbers, spaces, apostrophes (') and hyphens (-)"
        )
    )]
    pub full_name: Option<String>,
    #[validate(custom(function = validate_year_of_birth))]
    pub year_of_birth: Option<i32>,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Phone must be a valid phone number"))]
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    #[validate(length(max = 500, message = "Avatar must be at most 500 characters"))]
    pub avatar: Option<String>,
}

/// Whitelisted sort columns for the user listing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum UserSortBy {
    #[serde(rename = "fullName")]
    FullName,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl UserSortBy {
    pub fn column(self) -> &'static str {
        match self {
            UserSortBy::FullName => "full_name",
            UserSortBy::Email => "email",
            UserSortBy::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub status: Option<UserStatus>,
    pub role: Option<Role>,
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub sort_by: Option<UserSortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Created/updated record together with the human-readable outcome.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub data: User,
}

#[derive(Debug, Serialize)]
pub struct UserDataResponse {
    pub data: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub data: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// The refresh endpoint answers snake_case, matching its request.
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub message: String,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::first_violation;

    fn valid_register() -> RegisterRequest {
        RegisterRequest {
            full_name: "Test User".into(),
            year_of_birth: 1995,
            email: "a@x.com".into(),
            password: "secret1".into(),
            phone: "+998901234567".into(),
            role: None,
            avatar: None,
        }
    }

    #[test]
    fn register_accepts_a_seven_character_password() {
        let payload = valid_register();
        assert_eq!(payload.password.len(), 7);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn register_rejects_short_password() {
        let payload = RegisterRequest {
            password: "五char".into(),
            ..valid_register()
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(
            first_violation(&errors),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn register_rejects_malformed_email() {
        let payload = RegisterRequest {
            email: "not-an-email".into(),
            ..valid_register()
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn register_rejects_out_of_range_birth_year() {
        for year in [1899, 2999] {
            let payload = RegisterRequest {
                year_of_birth: year,
                ..valid_register()
            };
            assert!(payload.validate().is_err(), "year {year} should fail");
        }
    }

    #[test]
    fn register_rejects_bad_name_and_phone() {
        let payload = RegisterRequest {
            full_name: "bad;name".into(),
            ..valid_register()
        };
        assert!(payload.validate().is_err());

        let payload = RegisterRequest {
            phone: "call-me".into(),
            ..valid_register()
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn update_with_only_one_field_passes() {
        let payload = UpdateUserRequest {
            full_name: Some("Renamed User".into()),
            year_of_birth: None,
            email: None,
            password: None,
            phone: None,
            role: None,
            status: None,
            avatar: None,
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn update_still_validates_present_fields() {
        let payload = UpdateUserRequest {
            full_name: None,
            year_of_birth: None,
            email: None,
            password: Some("short".into()),
            phone: None,
            role: None,
            status: None,
            avatar: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn user_sort_columns_are_whitelisted() {
        assert_eq!(UserSortBy::FullName.column(), "full_name");
        assert_eq!(UserSortBy::Email.column(), "email");
        assert_eq!(UserSortBy::CreatedAt.column(), "created_at");
    }

    #[test]
    fn list_query_parses_camel_case_keys() {
        let q: ListUsersQuery = serde_json::from_str(
            r#"{"status":"Active","role":"Admin","sortBy":"fullName","sortOrder":"desc"}"#,
        )
        .unwrap();
        assert_eq!(q.status, Some(UserStatus::Active));
        assert_eq!(q.role, Some(Role::Admin));
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert!(matches!(q.sort_by, Some(UserSortBy::FullName)));
        assert_eq!(q.sort_order, Some(SortOrder::Desc));
    }

    #[test]
    fn login_response_is_camel_case() {
        let json = serde_json::to_string(&LoginResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
        })
        .unwrap();
        assert!(json.contains("\"accessToken\""));
        assert!(json.contains("\"refreshToken\""));
    }

    #[test]
    fn access_token_response_is_snake_case() {
        let json = serde_json::to_string(&AccessTokenResponse {
            message: "ok".into(),
            access_token: "a".into(),
        })
        .unwrap();
        assert!(json.contains("\"access_token\""));
        assert!(!json.contains("\"accessToken\""));
    }
}
