//! Post status, title and slug

use once_cell::sync::Lazy;
use regex::Regex;

use super::validation::bounded;
use super::ValidationError;

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 200;

/// Lowercase words joined by single hyphens
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("invalid slug regex"));

string_enum! {
    /// Publication state of a post
    pub enum PostStatus("status") {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
        Private => "private",
    }
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl PostStatus {
    /// Whether anonymous readers may see a post in this state.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Validated post title (1..=200 characters)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTitle(String);

impl PostTitle {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded("title", s, MAX_TITLE_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// URL slug of a post
///
/// # Example
/// ```
/// use ohmyblog_server::models::Slug;
///
/// assert!(Slug::new("hello-world-2").is_ok());
/// assert!(Slug::new("Hello-World").is_err());
/// assert!(Slug::new("double--dash").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "slug" });
        }
        if s.len() > MAX_SLUG_LEN {
            return Err(ValidationError::TooLong {
                field: "slug",
                max: MAX_SLUG_LEN,
            });
        }
        if !SLUG_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "slug",
                reason: "must be lowercase letters and digits separated by single hyphens",
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_published_is_public() {
        let public: Vec<_> = PostStatus::ALL.iter().filter(|s| s.is_public()).collect();
        assert_eq!(public, vec![&PostStatus::Published]);
        assert_eq!(PostStatus::default(), PostStatus::Draft);
    }

    #[test]
    fn status_from_row_value() {
        assert_eq!(
            PostStatus::try_from("archived".to_string()).unwrap(),
            PostStatus::Archived
        );
        assert!(PostStatus::try_from("Archived".to_string()).is_err());
    }

    #[test]
    fn title_length_limit() {
        assert!(PostTitle::new(&"t".repeat(200)).is_ok());
        assert!(matches!(
            PostTitle::new(&"t".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
        assert!(matches!(
            PostTitle::new("  "),
            Err(ValidationError::Empty { field: "title" })
        ));
    }

    #[test]
    fn slug_format() {
        assert!(Slug::new("rust-2024").is_ok());
        assert!(Slug::new("a").is_ok());
        for bad in ["-lead", "trail-", "under_score", "spa ce", "UPPER"] {
            assert!(
                matches!(Slug::new(bad), Err(ValidationError::InvalidFormat { .. })),
                "{bad} should be rejected"
            );
        }
        assert!(matches!(Slug::new(""), Err(ValidationError::Empty { .. })));
    }

    #[test]
    fn slug_max_length() {
        assert!(Slug::new(&"a".repeat(200)).is_ok());
        assert!(matches!(
            Slug::new(&"a".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
    }
}
