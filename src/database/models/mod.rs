pub mod application;
pub mod cart;
pub mod class;
pub mod payment;
pub mod user;

pub use application::InstructorApplication;
pub use cart::CartItem;
pub use class::{ClassPayload, ClassStatus, StatusChange};
pub use payment::{EnrolledRecord, PaymentInfo, PreparedPayment};
pub use user::{NewUser, Role, UserUpdate};

use serde_json::Value;
use thiserror::Error;

/// Request payloads that deserialized but break a field rule
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ModelError {
    pub fn field(&self) -> &'static str {
        match self {
            ModelError::MissingField(field) => field,
            ModelError::InvalidField { field, .. } => field,
        }
    }
}

/// Stored form of an email: trimmed and lowercased, so lookups and the
/// uniqueness check ignore case
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(field: &'static str, email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ModelError::MissingField(field));
    }
    if !email.contains('@') {
        return Err(ModelError::InvalidField { field, reason: format!("'{}' is not an email address", email) });
    }
    Ok(())
}

/// Integer from a JSON number or a string holding one. Whole floats are accepted.
pub fn coerce_int(field: &'static str, value: &Value) -> Result<i64, ModelError> {
    let invalid = || ModelError::InvalidField { field, reason: format!("expected an integer, got {}", value) };
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(i),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
            _ => Err(invalid()),
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Number from a JSON number or a numeric string
pub fn coerce_number(field: &'static str, value: &Value) -> Result<Value, ModelError> {
    let invalid = || ModelError::InvalidField { field, reason: format!("expected a number, got {}", value) };
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Value::from(i));
            }
            s.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emails_need_an_at_sign() {
        assert!(validate_email("email", "ana@yoga.io").is_ok());
        assert_eq!(validate_email("email", "  "), Err(ModelError::MissingField("email")));
        assert!(matches!(validate_email("email", "ana.yoga.io"), Err(ModelError::InvalidField { field: "email", .. })));
    }

    #[test]
    fn coerces_integers() {
        assert_eq!(coerce_int("availableSeats", &json!(12)), Ok(12));
        assert_eq!(coerce_int("availableSeats", &json!(" 30 ")), Ok(30));
        assert_eq!(coerce_int("availableSeats", &json!(4.0)), Ok(4));
        assert!(coerce_int("availableSeats", &json!(4.5)).is_err());
        assert!(coerce_int("availableSeats", &json!("ten")).is_err());
        assert!(coerce_int("availableSeats", &json!(null)).is_err());
    }

    #[test]
    fn coerces_prices() {
        assert_eq!(coerce_number("price", &json!("25")), Ok(json!(25)));
        assert_eq!(coerce_number("price", &json!("19.5")), Ok(json!(19.5)));
        assert_eq!(coerce_number("price", &json!(40)), Ok(json!(40)));
        assert!(coerce_number("price", &json!("free")).is_err());
    }
}
