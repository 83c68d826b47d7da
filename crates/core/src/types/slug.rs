//! URL-safe category slugs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when deriving a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The name has no ASCII letters or digits to build a slug from.
    #[error("name must contain at least one letter or digit")]
    Empty,
}

/// A lowercase, hyphen-separated identifier derived from a display name.
///
/// ```
/// use real_taste_core::Slug;
///
/// let slug = Slug::from_name("Hot & Cold Beverages").unwrap();
/// assert_eq!(slug.as_str(), "hot-cold-beverages");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Build a slug from a display name.
    ///
    /// Lowercases the name, collapses every run of characters outside
    /// `[a-z0-9]` into a single `-`, and strips leading/trailing hyphens.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` if nothing remains.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c);
            } else {
                pending_hyphen = true;
            }
        }

        if slug.is_empty() {
            return Err(SlugError::Empty);
        }

        Ok(Self(slug))
    }

    /// Wrap a value already stored as a slug.
    #[must_use]
    pub const fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
