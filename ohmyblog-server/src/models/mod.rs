//! Domain models with validation at construction
//!
//! Request input is turned into these types before it reaches a
//! repository. Invalid input yields a [`ValidationError`], never a panic.

pub mod validation;

/// Declare a lowercase string-backed enum with `as_str`, `FromStr`,
/// `TryFrom<String>` (for sqlx row decoding) and serde support.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($field:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::models::ValidationError::InvalidVariant {
                        field: $field,
                        value: other.to_owned(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::models::ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }
    };
}

pub mod comment;
pub mod pagination;
pub mod post;
pub mod system_config;
pub mod user;

pub use comment::{CommentContent, CommentStatus};
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use post::{PostStatus, PostTitle, Slug};
pub use system_config::{ConfigKey, ConfigType};
pub use user::{Email, UserRole, UserStatus, Username};
pub use validation::ValidationError;
