use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::auth::{dto::SignupRequest, errors::AuthError};

const MAX_EMAIL_LEN: usize = 120;
const MAX_NAME_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_BALANCE_SCALE: u32 = 2;
// users.opening_balance is NUMERIC(14, 2)
const BALANCE_LIMIT: i64 = 1_000_000_000_000;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,14}$").unwrap();
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

fn clean_name(field: &str, value: &str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value.to_owned())
}

/// Normalises a signup payload in place (trimmed names and phone, lower-cased
/// email) and rejects anything that may not be stored.
pub(crate) fn validate_signup(req: &mut SignupRequest) -> Result<(), AuthError> {
    req.first_name = clean_name("first_name", &req.first_name)?;
    req.last_name = clean_name("last_name", &req.last_name)?;

    req.email = normalize_email(&req.email);
    if !is_valid_email(&req.email) {
        return Err(AuthError::Validation("Invalid email".into()));
    }

    req.phone_number = req.phone_number.trim().to_owned();
    if !is_valid_phone(&req.phone_number) {
        return Err(AuthError::Validation("Invalid phone number".into()));
    }

    let password_len = req.password.chars().count();
    if password_len < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation("Password too short".into()));
    }
    if password_len > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation("Password too long".into()));
    }

    if let Some(dob) = req.date_of_birth {
        if dob > OffsetDateTime::now_utc().date() {
            return Err(AuthError::Validation(
                "date_of_birth cannot be in the future".into(),
            ));
        }
    }

    if let Some(balance) = req.opening_balance {
        if balance < Decimal::ZERO {
            return Err(AuthError::Validation(
                "opening_balance cannot be negative".into(),
            ));
        }
        if balance >= Decimal::from(BALANCE_LIMIT) {
            return Err(AuthError::Validation(
                "opening_balance is too large".into(),
            ));
        }
        if balance.scale() > MAX_BALANCE_SCALE {
            return Err(AuthError::Validation(
                "opening_balance allows at most 2 decimal places".into(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SignupRequest {
        SignupRequest {
            first_name: "  Ada ".into(),
            last_name: "Lovelace".into(),
            email: " Ada@Example.COM ".into(),
            phone_number: " +919876543210 ".into(),
            password: "pw123456".into(),
            date_of_birth: None,
            gender: None,
            opening_balance: None,
        }
    }

    fn message(err: AuthError) -> String {
        match err {
            AuthError::Validation(m) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn normalizes_valid_request() {
        let mut req = request();
        validate_signup(&mut req).expect("valid");
        assert_eq!(req.first_name, "Ada");
        assert_eq!(req.email, "ada@example.com");
        assert_eq!(req.phone_number, "+919876543210");
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email(""));
        let long = format!("{}@x.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(!is_valid_email(&long));
    }

    #[test]
    fn phone_shapes() {
        assert!(is_valid_phone("5551234567"));
        assert!(is_valid_phone("+15551234567"));
        assert!(!is_valid_phone("555-123-4567"));
        assert!(!is_valid_phone("+1234"));
        assert!(!is_valid_phone("+1234567890123456"));
    }

    #[test]
    fn rejects_bad_email() {
        let mut req = request();
        req.email = "nope".into();
        assert_eq!(message(validate_signup(&mut req).unwrap_err()), "Invalid email");
    }

    #[test]
    fn rejects_short_password() {
        let mut req = request();
        req.password = "short".into();
        assert_eq!(
            message(validate_signup(&mut req).unwrap_err()),
            "Password too short"
        );
    }

    #[test]
    fn rejects_blank_name() {
        let mut req = request();
        req.last_name = "   ".into();
        assert_eq!(
            message(validate_signup(&mut req).unwrap_err()),
            "last_name is required"
        );
    }

    #[test]
    fn rejects_future_birth_date() {
        let mut req = request();
        req.date_of_birth = Some(OffsetDateTime::now_utc().date() + time::Duration::days(2));
        assert!(validate_signup(&mut req).is_err());
    }

    #[test]
    fn rejects_negative_or_overprecise_balance() {
        let mut req = request();
        req.opening_balance = Some(Decimal::new(-1, 0));
        assert!(validate_signup(&mut req).is_err());

        let mut req = request();
        req.opening_balance = Some(Decimal::new(1001, 3));
        assert!(validate_signup(&mut req).is_err());

        let mut req = request();
        req.opening_balance = Some(Decimal::new(1001, 2));
        assert!(validate_signup(&mut req).is_ok());
    }

    #[test]
    fn rejects_balance_beyond_column_range() {
        let mut req = request();
        req.opening_balance = Some(Decimal::new(1_000_000_000_000, 0));
        assert_eq!(
            message(validate_signup(&mut req).unwrap_err()),
            "opening_balance is too large"
        );

        let mut req = request();
        req.opening_balance = Some(Decimal::new(1_000_000_000_000_000, 0));
        assert!(validate_signup(&mut req).is_err());

        let mut req = request();
        req.opening_balance = Some(Decimal::new(99_999_999_999_999, 2));
        assert!(validate_signup(&mut req).is_ok());
    }
}
