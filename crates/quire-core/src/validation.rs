//! Boundary validation for typed request structs.
//!
//! Every mutating request is validated before it reaches the store, so a
//! validation failure never leaves partial state behind.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::*;
use crate::error::{Error, Result};
use crate::traits::{
    CreateNoteRequest, CreateUserRequest, LoginRequest, RegisterRequest, RenameTagRequest,
    ResetPasswordRequest, UpdateNoteRequest,
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Require a non-blank value.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

/// Require a value no longer than `max` characters.
pub fn max_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::InvalidInput(format!(
            "{} must be {} characters or less",
            field, max
        )));
    }
    Ok(())
}

/// Validate an email address shape.
pub fn validate_email(email: &str) -> Result<()> {
    require("Email", email)?;
    max_len("Email", email, EMAIL_MAX_LEN)?;
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(Error::InvalidInput("Invalid email address".to_string()));
    }
    Ok(())
}

/// Validate a new password.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(Error::InvalidInput(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    Ok(())
}

fn validate_display_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if !(DISPLAY_NAME_MIN_LEN..=DISPLAY_NAME_MAX_LEN).contains(&len) {
        return Err(Error::InvalidInput(format!(
            "Display name must be between {} and {} characters",
            DISPLAY_NAME_MIN_LEN, DISPLAY_NAME_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_note_fields(title: &str, body: &str, source: Option<&str>) -> Result<()> {
    require("Title", title)?;
    max_len("Title", title, NOTE_TITLE_MAX_LEN)?;
    require("Body", body)?;
    if let Some(source) = source {
        max_len("Source", source, NOTE_SOURCE_MAX_LEN)?;
    }
    Ok(())
}

/// Blank optional text is stored as NULL.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CreateNoteRequest {
    /// Validate required fields and lengths.
    pub fn validate(&self) -> Result<()> {
        validate_note_fields(&self.title, &self.body, self.source.as_deref())
    }
}

impl UpdateNoteRequest {
    /// Validate required fields and lengths.
    pub fn validate(&self) -> Result<()> {
        validate_note_fields(&self.title, &self.body, self.source.as_deref())
    }
}

impl CreateUserRequest {
    /// Validate email shape, display name and password length.
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_display_name(&self.display_name)?;
        validate_password(&self.password)
    }
}

impl RegisterRequest {
    /// Validate email shape, display name and password length.
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_display_name(&self.display_name)?;
        validate_password(&self.password)
    }
}

impl LoginRequest {
    /// Both fields are required; shape is not checked.
    pub fn validate(&self) -> Result<()> {
        require("Email", &self.email)?;
        require("Password", &self.password)
    }
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<()> {
        validate_password(&self.password)
    }
}

impl RenameTagRequest {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("Tag name cannot be empty.".to_string()));
        }
        max_len("Tag name", self.name.trim(), TAG_NAME_MAX_LEN)
    }
}
