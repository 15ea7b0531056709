use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use validator::{ValidationError, ValidationErrors};

lazy_static! {
    pub static ref NAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9\s'-]+$").unwrap();
    pub static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

/// Sort direction accepted by all list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

// serde defaults shared by the list-endpoint query types.
pub(crate) fn default_page() -> i64 {
    1
}
pub(crate) fn default_limit() -> i64 {
    10
}

/// First violation message out of a validation run, in stable field order.
pub fn first_violation(errors: &ValidationErrors) -> String {
    let mut fields: Vec<(&str, &Vec<ValidationError>)> =
        errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(name, _)| *name);
    for (name, list) in fields {
        if let Some(err) = list.first() {
            return match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", name),
            };
        }
    }
    "Validation failed".to_string()
}

pub fn validate_year_of_birth(year: i32) -> Result<(), ValidationError> {
    let current = time::OffsetDateTime::now_utc().year();
    if (1900..=current).contains(&year) {
        Ok(())
    } else {
        let mut err = ValidationError::new("year_of_birth");
        err.message = Some("Year of birth must be between 1900 and the current year".into());
        Err(err)
    }
}

pub fn validate_price(price: f64) -> Result<(), ValidationError> {
    if price < 0.01 {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must be greater than 0".into());
        return Err(err);
    }
    let cents = price * 100.0;
    if (cents - cents.round()).abs() > 1e-6 {
        let mut err = ValidationError::new("price");
        err.message = Some("Price can have up to two decimal places".into());
        return Err(err);
    }
    Ok(())
}
