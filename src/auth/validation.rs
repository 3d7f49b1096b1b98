use std::sync::LazyLock;

use regex::Regex;

use crate::error::FeedError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Trim and lower-case an email address. Emails are compared in this form.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check a registration form. Rules run in field order and the first
/// failure is reported.
pub fn validate_registration(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<(), FeedError> {
    validate_name("first_name", first_name)?;
    validate_name("last_name", last_name)?;
    validate_email(email)?;

    if password.is_empty() {
        return Err(FeedError::validation("password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FeedError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Check a login form.
pub fn validate_login(email: &str, password: &str) -> Result<(), FeedError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(FeedError::validation("password is required"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), FeedError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(FeedError::validation("email is required"));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(FeedError::validation(format!(
            "email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(FeedError::validation("Invalid email format"));
    }
    Ok(())
}

/// Trimmed post or comment body, or a validation error if nothing is left.
pub fn require_content(content: &str) -> Result<&str, FeedError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(FeedError::validation("content is required"));
    }
    Ok(content)
}

fn validate_name(field: &str, value: &str) -> Result<(), FeedError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FeedError::validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(FeedError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}
