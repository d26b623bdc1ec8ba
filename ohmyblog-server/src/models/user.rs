//! User roles, statuses and identity fields

use super::validation::bounded;
use super::ValidationError;

const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 100;

string_enum! {
    /// Role granted to a user account
    pub enum UserRole("role") {
        Admin => "admin",
        Editor => "editor",
        User => "user",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

string_enum! {
    /// Account state
    pub enum UserStatus("status") {
        Active => "active",
        Inactive => "inactive",
        Banned => "banned",
    }
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Validated username (1..=50 characters, no whitespace)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let name = bounded("username", s, MAX_USERNAME_LEN)?;
        if name.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "must not contain whitespace",
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated email address.
///
/// Only the shape is checked: at most 100 characters, exactly one `@`
/// with something on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let email = bounded("email", s, MAX_EMAIL_LEN)?;
        let shape_ok = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        };
        if !shape_ok || email.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like name@domain",
            });
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
