use crate::error::{FieldOpsError, FieldOpsResult};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use validator::{Validate, ValidationErrors};

pub fn validate_model<T: Validate>(model: &T) -> FieldOpsResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(FieldOpsError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match &error.code {
                std::borrow::Cow::Borrowed("email") => "Invalid email format".to_string(),
                std::borrow::Cow::Borrowed("length") => {
                    format!("Length validation failed for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("range") => {
                    format!("Value out of range for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("required") => {
                    format!("Field '{}' is required", field)
                }
                _ => format!("Validation failed for field '{}': {}", field, error.code),
            };
            messages.push(message);
        }
    }

    messages.sort();
    messages.join(", ")
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 .()\-]{5,19}$").expect("phone pattern is valid"))
}

fn postal_code_regex() -> &'static Regex {
    static POSTAL_CODE: OnceLock<Regex> = OnceLock::new();
    POSTAL_CODE.get_or_init(|| Regex::new(r"^[0-9]{5}$").expect("postal code pattern is valid"))
}

pub fn validate_email_address(email: &str) -> FieldOpsResult<()> {
    if !validator::validate_email(email) {
        return Err(FieldOpsError::validation("email", "Invalid email address format"));
    }

    Ok(())
}

pub fn validate_phone_number(phone: &str) -> FieldOpsResult<()> {
    if !phone_regex().is_match(phone) {
        return Err(FieldOpsError::validation(
            "telephone",
            "Invalid phone number, expected digits with optional +, spaces, dots or dashes",
        ));
    }

    Ok(())
}

/// French postal codes are exactly five digits.
pub fn validate_postal_code(code: &str) -> FieldOpsResult<()> {
    if !postal_code_regex().is_match(code) {
        return Err(FieldOpsError::validation(
            "code_postal",
            "Invalid postal code, expected 5 digits",
        ));
    }

    Ok(())
}

pub fn validate_uuid(uuid_str: &str) -> FieldOpsResult<uuid::Uuid> {
    uuid::Uuid::parse_str(uuid_str.trim())
        .map_err(|_| FieldOpsError::validation("uuid", "Invalid UUID format"))
}

pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> FieldOpsResult<()> {
    if end_date < start_date {
        return Err(FieldOpsError::validation(
            "date_range",
            "End date must not be before start date",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_address() {
        assert!(validate_email_address("test@example.com").is_ok());
        assert!(validate_email_address("invalid-email").is_err());
        assert!(validate_email_address("@example.com").is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("01 23 45 67 89").is_ok());
        assert!(validate_phone_number("+33 6.12.34.56.78").is_ok());
        assert!(validate_phone_number("call me").is_err());
        assert!(validate_phone_number("12").is_err());
    }

    #[test]
    fn test_validate_postal_code() {
        assert!(validate_postal_code("75011").is_ok());
        assert!(validate_postal_code("7501").is_err());
        assert!(validate_postal_code("75O11").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert!(validate_date_range(start, end).is_ok());
        assert!(validate_date_range(start, start).is_ok());
        assert!(validate_date_range(end, start).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid(" 67e55044-10b1-426f-9247-bb680e5fe0c8 ").is_ok());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
