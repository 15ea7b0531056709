use serde::Deserialize;
use validator::Validate;

use crate::validation::{default_limit, default_page, SortOrder, NAME_RE};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(
        length(min = 2, max = 100, message = "Name must be at least 2 characters"),
        regex(
            path = *NAME_RE,
            message = "Name can only contain letters, numbers, spaces, apostrophes (') and hyphens (-)"
        )
    )]
    pub name: Option<String>,
}

/// Same shape as create; the name stays mandatory on update as well.
pub type UpdateCategoryRequest = CreateCategoryRequest;

/// Categories sort by name only; callers pick the direction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCategoriesQuery {
    pub search: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::first_violation;

    #[test]
    fn name_rules_apply_when_present() {
        let payload = CreateCategoryRequest {
            name: Some("x".into()),
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(
            first_violation(&errors),
            "Name must be at least 2 characters"
        );

        let payload = CreateCategoryRequest {
            name: Some("Fruit & Veg".into()),
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(
            first_violation(&errors),
            "Name can only contain letters, numbers, spaces, apostrophes (') and hyphens (-)"
        );
    }

    #[test]
    fn absent_name_passes_schema_validation() {
        // Presence is enforced by the handler, not the schema.
        let payload = CreateCategoryRequest { name: None };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn list_query_defaults() {
        let q: ListCategoriesQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert!(q.search.is_none());
        assert!(q.sort_order.is_none());
    }
}
