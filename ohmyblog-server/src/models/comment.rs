//! Comment moderation status and body

use super::ValidationError;

string_enum! {
    /// Moderation state of a comment
    pub enum CommentStatus("status") {
        Pending => "pending",
        Approved => "approved",
        Spam => "spam",
        Trash => "trash",
    }
}

impl Default for CommentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Non-empty comment body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentContent(String);

impl CommentContent {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
