//! Item field validation

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ItemValidationError {
    #[error("Name is required")]
    MissingName,

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },
}

const MAX_FIELD_LENGTH: usize = 100;

pub fn validate_item_name(name: &str) -> Result<(), ItemValidationError> {
    if name.trim().is_empty() {
        return Err(ItemValidationError::MissingName);
    }

    check_length("name", name)
}

pub fn validate_item_value(value: &str) -> Result<(), ItemValidationError> {
    check_length("value", value)
}

fn check_length(field: &'static str, input: &str) -> Result<(), ItemValidationError> {
    if input.chars().count() > MAX_FIELD_LENGTH {
        return Err(ItemValidationError::TooLong {
            field,
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_rules() {
        assert!(validate_item_name("widget").is_ok());
        assert_eq!(validate_item_name(" "), Err(ItemValidationError::MissingName));
        assert_eq!(
            validate_item_name(&"n".repeat(101)),
            Err(ItemValidationError::TooLong {
                field: "name",
                max: 100
            })
        );
    }

    #[test]
    fn test_value_may_be_empty() {
        assert!(validate_item_value("").is_ok());
        assert!(validate_item_value(&"v".repeat(101)).is_err());
    }
}
