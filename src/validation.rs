//! Request checks applied by handlers before calling into the services.

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_TITLE_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 1024;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn check_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(())
}

/// At least 8 characters with a lowercase letter, an uppercase letter, a
/// digit and a symbol.
pub fn check_new_password(password: &str) -> Result<(), AppError> {
    let strong = password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    if !strong {
        return Err(AppError::validation(
            "Password should contain at least 8 characters, including uppercase and \
             lowercase letters, numbers, and special characters",
        ));
    }
    Ok(())
}

pub fn check_login_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password too short"));
    }
    Ok(())
}

fn check_text(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn check_title(title: &str) -> Result<(), AppError> {
    check_text("title", title, MAX_TITLE_LEN)
}

pub fn check_description(description: &str) -> Result<(), AppError> {
    check_text("description", description, MAX_DESCRIPTION_LEN)
}

/// Malformed ids are a client error, not a storage failure.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation("Invalid article id"))
}
