use bigdecimal::BigDecimal;
use serde::Deserialize;
use std::fmt;
use uuid::Uuid;

use crate::db::models::{ORDER_STATUSES, PRODUCT_CATEGORIES, USER_STATUSES};

pub const BRAND_MAX_LEN: usize = 100;
pub const MODEL_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 2000;
pub const IMAGE_URL_MAX_LEN: usize = 2048;
pub const FIRST_MODEL_YEAR: i32 = 1886;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for crate::error::AppError {
    fn from(err: ValidationError) -> Self {
        crate::error::AppError::Validation(err.to_string())
    }
}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(ValidationError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

// --- Request payloads ---

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: BigDecimal,
    pub category: String,
    pub description: String,
    pub quantity: i32,
    pub image_url: String,
}

pub fn validate_new_product(payload: &NewProduct) -> ValidationResult {
    validate_required("brand", &payload.brand)?;
    validate_max_len("brand", &payload.brand, BRAND_MAX_LEN)?;
    validate_required("model", &payload.model)?;
    validate_max_len("model", &payload.model, MODEL_MAX_LEN)?;

    if payload.year < FIRST_MODEL_YEAR {
        return Err(ValidationError::new("year", "must be a valid model year"));
    }

    validate_positive_amount("price", &payload.price)?;
    validate_enum("category", &payload.category, PRODUCT_CATEGORIES)?;
    validate_required("description", &payload.description)?;
    validate_max_len("description", &payload.description, DESCRIPTION_MAX_LEN)?;

    if payload.quantity < 0 {
        return Err(ValidationError::new("quantity", "must not be negative"));
    }

    validate_required("image_url", &payload.image_url)?;
    validate_max_len("image_url", &payload.image_url, IMAGE_URL_MAX_LEN)?;

    Ok(())
}

/// Partial update; unknown JSON keys are ignored on deserialization, which
/// is how "only recognized attributes apply" is enforced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
}

pub fn validate_update_product(payload: &UpdateProduct) -> ValidationResult {
    if let Some(brand) = &payload.brand {
        validate_required("brand", brand)?;
        validate_max_len("brand", brand, BRAND_MAX_LEN)?;
    }
    if let Some(model) = &payload.model {
        validate_required("model", model)?;
        validate_max_len("model", model, MODEL_MAX_LEN)?;
    }
    if let Some(year) = payload.year {
        if year < FIRST_MODEL_YEAR {
            return Err(ValidationError::new("year", "must be a valid model year"));
        }
    }
    if let Some(price) = &payload.price {
        validate_positive_amount("price", price)?;
    }
    if let Some(category) = &payload.category {
        validate_enum("category", category, PRODUCT_CATEGORIES)?;
    }
    if let Some(description) = &payload.description {
        validate_max_len("description", description, DESCRIPTION_MAX_LEN)?;
    }
    if let Some(quantity) = payload.quantity {
        if quantity < 0 {
            return Err(ValidationError::new("quantity", "must not be negative"));
        }
    }
    if let Some(image_url) = &payload.image_url {
        validate_required("image_url", image_url)?;
        validate_max_len("image_url", image_url, IMAGE_URL_MAX_LEN)?;
    }

    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub product: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub products: Vec<OrderLine>,
}

/// Per-line checks only. The empty-order case is the workflow's own
/// precondition and is reported there, before any inventory access.
pub fn validate_order_request(payload: &OrderRequest) -> ValidationResult {
    for line in &payload.products {
        if line.quantity < 1 {
            return Err(ValidationError::new("quantity", "must be at least 1"));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
}

pub fn validate_order_status(payload: &UpdateOrderStatus) -> ValidationResult {
    validate_enum("status", &payload.status, ORDER_STATUSES)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeUserStatus {
    pub status: String,
}

pub fn validate_user_status(payload: &ChangeUserStatus) -> ValidationResult {
    validate_enum("status", &payload.status, USER_STATUSES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn valid_product() -> NewProduct {
        NewProduct {
            brand: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2023,
            price: BigDecimal::from(23000),
            category: "Sedan".to_string(),
            description: "Compact sedan".to_string(),
            quantity: 4,
            image_url: "https://img.example.com/civic.jpg".to_string(),
        }
    }

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn validates_enum_values() {
        assert!(validate_enum("category", "SUV", PRODUCT_CATEGORIES).is_ok());
        assert!(validate_enum("category", "Hatchback", PRODUCT_CATEGORIES).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  Honda\tCivic  "), "Honda Civic");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_positive_amount() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        assert!(validate_positive_amount("price", &positive).is_ok());
        assert!(validate_positive_amount("price", &BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount("price", &BigDecimal::from(-1)).is_err());
    }

    #[test]
    fn accepts_valid_product() {
        assert!(validate_new_product(&valid_product()).is_ok());
    }

    #[test]
    fn rejects_pre_automobile_year() {
        let mut product = valid_product();
        product.year = 1700;
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn rejects_unknown_category() {
        let mut product = valid_product();
        product.category = "Spaceship".to_string();
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn rejects_negative_quantity() {
        let mut product = valid_product();
        product.quantity = -1;
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn update_validates_only_present_fields() {
        let empty = UpdateProduct::default();
        assert!(validate_update_product(&empty).is_ok());

        let bad_price = UpdateProduct {
            price: Some(BigDecimal::from(0)),
            ..UpdateProduct::default()
        };
        assert!(validate_update_product(&bad_price).is_err());
    }

    #[test]
    fn update_payload_ignores_unknown_keys() {
        let parsed: UpdateProduct =
            serde_json::from_str(r#"{"brand":"Kia","owner":"someone-else","__v":9}"#)
                .expect("unknown keys are ignored");
        assert_eq!(parsed.brand.as_deref(), Some("Kia"));
    }

    #[test]
    fn order_lines_require_positive_quantity() {
        let payload = OrderRequest {
            products: vec![OrderLine {
                product: Uuid::new_v4(),
                quantity: 0,
            }],
        };
        assert!(validate_order_request(&payload).is_err());
    }

    #[test]
    fn order_status_must_be_known() {
        assert!(validate_order_status(&UpdateOrderStatus {
            status: "Shipped".to_string()
        })
        .is_ok());
        assert!(validate_order_status(&UpdateOrderStatus {
            status: "Teleported".to_string()
        })
        .is_err());
    }

    #[test]
    fn user_status_must_be_known() {
        assert!(validate_user_status(&ChangeUserStatus {
            status: "blocked".to_string()
        })
        .is_ok());
        assert!(validate_user_status(&ChangeUserStatus {
            status: "suspended".to_string()
        })
        .is_err());
    }
}
