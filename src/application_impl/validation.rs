use crate::application_port::AuthError;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^([a-z\d.-]+)@([a-z\d-]+)\.([a-z]{2,12})(\.[a-z]{2,12})?$")
            .expect("email pattern compiles");
}

pub const NAME_LEN: (usize, usize) = (3, 30);
pub const PASSWORD_LEN: (usize, usize) = (6, 20);
pub const BIO_MAX_LEN: usize = 100;

fn within(text: &str, (min, max): (usize, usize)) -> bool {
    let len = text.chars().count();
    len >= min && len <= max
}

/// Expects an already lower-cased address.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(AuthError::InvalidInput("Invalid email address".to_string()))
    }
}

pub fn validate_name(field: &str, value: &str) -> Result<(), AuthError> {
    if within(value, NAME_LEN) {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(format!(
            "{field} must be between {} and {} characters",
            NAME_LEN.0, NAME_LEN.1
        )))
    }
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if within(password, PASSWORD_LEN) {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(format!(
            "password must be between {} and {} characters",
            PASSWORD_LEN.0, PASSWORD_LEN.1
        )))
    }
}

pub fn birth_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, AuthError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AuthError::InvalidInput("invalid birth date".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern() {
        assert!(validate_email("jane.doe@mail.example.org").is_ok());
        assert!(validate_email("a-b@host.io").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("x@host").is_err());
        assert!(validate_email("x@host.c").is_err());
        assert!(validate_email("x+tag@host.com").is_err());
    }

    #[test]
    fn length_bounds_are_inclusive() {
        assert!(validate_name("first name", "Ann").is_ok());
        assert!(validate_name("first name", "Al").is_err());
        assert!(validate_name("last name", &"x".repeat(30)).is_ok());
        assert!(validate_name("last name", &"x".repeat(31)).is_err());
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(21)).is_err());
    }

    #[test]
    fn birth_date_rejects_impossible_days() {
        assert!(birth_date(2000, 2, 29).is_ok());
        assert!(birth_date(2001, 2, 29).is_err());
        assert!(birth_date(2001, 13, 1).is_err());
    }
}
