use std::collections::HashMap;

use thiserror::Error;

use crate::database::models::OrderStatus;
use crate::database::DatabaseError;

pub type FieldErrors = HashMap<String, String>;

/// Business-level failure. This is the only place where store errors are
/// classified into something a client is allowed to see.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: FieldErrors,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Conflict { field: String, message: String },

    /// Payment attempted on an order that is no longer pending.
    #[error("{}", not_payable_message(.0))]
    OrderNotPayable(OrderStatus),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Internal(String),
}

fn not_payable_message(status: &OrderStatus) -> &'static str {
    match status {
        OrderStatus::Paid => "order has been paid",
        OrderStatus::Cancelled => "order has been cancelled",
        OrderStatus::Pending => "order is not pending",
    }
}

impl ServiceError {
    pub fn validation(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_field(field: impl Into<String>, problem: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), problem.into());
        Self::validation("validation failed", field_errors)
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Conflict {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal(message.into())
    }
}

/// Translate `validator` failures into a flat `{field: message}` map.
pub fn translate_validation_errors(errors: &validator::ValidationErrors) -> FieldErrors {
    let mut field_errors = HashMap::new();
    for (field, failures) in errors.field_errors() {
        let field = field.to_string();
        let Some(failure) = failures.first() else {
            continue;
        };
        let message = match failure.code.as_ref() {
            "required" => format!("{field} is required"),
            "email" => "invalid email format".to_string(),
            "length" => length_message(&field, failure),
            "range" => format!("{field} is out of range"),
            _ => failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("invalid value for {field}")),
        };
        field_errors.insert(field, message);
    }
    field_errors
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::validation(
            "validation failed, please check your input",
            translate_validation_errors(&errors),
        )
    }
}

fn length_message(field: &str, failure: &validator::ValidationError) -> String {
    let min = failure.params.get("min").and_then(|v| v.as_u64());
    let max = failure.params.get("max").and_then(|v| v.as_u64());
    let actual = failure
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .map(|s| s.chars().count() as u64);

    match (min, max, actual) {
        (Some(min), _, Some(len)) if len < min => format!("{field} must be at least {min} characters"),
        (_, Some(max), _) => format!("{field} must be at most {max} characters"),
        (Some(min), None, _) => format!("{field} must be at least {min} characters"),
        (None, None, _) => format!("invalid length for {field}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(email)]
        email: String,
        #[validate(length(min = 1, max = 5))]
        name: String,
    }

    #[test]
    fn not_payable_messages_are_distinct() {
        let paid = ServiceError::OrderNotPayable(OrderStatus::Paid).to_string();
        let cancelled = ServiceError::OrderNotPayable(OrderStatus::Cancelled).to_string();
        let generic = ServiceError::OrderNotPayable(OrderStatus::Pending).to_string();
        assert_eq!(paid, "order has been paid");
        assert_eq!(cancelled, "order has been cancelled");
        assert_eq!(generic, "order is not pending");
    }

    #[test]
    fn translates_validator_errors_per_field() {
        let input = Signup {
            email: "not-an-email".to_string(),
            name: "far too long".to_string(),
        };
        let err: ServiceError = input.validate().unwrap_err().into();
        match err {
            ServiceError::Validation { field_errors, .. } => {
                assert_eq!(field_errors["email"], "invalid email format");
                assert_eq!(field_errors["name"], "name must be at most 5 characters");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_values_report_minimum() {
        let input = Signup {
            email: "a@b.co".to_string(),
            name: String::new(),
        };
        let err: ServiceError = input.validate().unwrap_err().into();
        match err {
            ServiceError::Validation { field_errors, .. } => {
                assert_eq!(field_errors["name"], "name must be at least 1 characters");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
