use crate::error::DeckError;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// AppIdentity
// ---------------------------------------------------------------------------

/// Logical address of an app: `apps/{category}/{name}.tsx`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppIdentity {
    pub category: String,
    pub name: String,
}

impl AppIdentity {
    /// Builds an identity, rejecting segments that could escape the catalog.
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Result<Self, DeckError> {
        let identity = Self {
            category: category.into(),
            name: name.into(),
        };
        identity.check_segments()?;
        Ok(identity)
    }

    pub fn check_segments(&self) -> Result<(), DeckError> {
        if paths::is_safe_segment(&self.category) && paths::is_safe_segment(&self.name) {
            Ok(())
        } else {
            Err(DeckError::InvalidIdentity(self.to_string()))
        }
    }

    /// Store key, `category/name`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

impl std::str::FromStr for AppIdentity {
    type Err = DeckError;

    /// Parses `category/name`. Anything with more or fewer than two segments
    /// is rejected so `a/../b` never reaches the filesystem.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(category), Some(name), None) => AppIdentity::new(category, name)
                .map_err(|_| DeckError::InvalidIdentity(s.to_string())),
            _ => Err(DeckError::InvalidIdentity(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// AppSource
// ---------------------------------------------------------------------------

/// Loaded source of one app. Lives for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppSource {
    pub identity: AppIdentity,
    pub path: PathBuf,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parse_category_and_name() {
        let id = AppIdentity::from_str("widgets/my-widget").unwrap();
        assert_eq!(id.category, "widgets");
        assert_eq!(id.name, "my-widget");
        assert_eq!(id.to_string(), "widgets/my-widget");
    }

    #[test]
    fn parse_rejects_traversal_and_extra_segments() {
        for s in ["../etc/passwd", "widgets/..", "a/b/c", "/widgets", "widgets/", "solo"] {
            assert!(
                matches!(AppIdentity::from_str(s), Err(DeckError::InvalidIdentity(_))),
                "expected invalid: {s}"
            );
        }
    }

    #[test]
    fn new_rejects_unsafe_segments() {
        assert!(AppIdentity::new("..", "x").is_err());
        assert!(AppIdentity::new("widgets", "a/b").is_err());
        assert!(AppIdentity::new("widgets", "").is_err());
        assert!(AppIdentity::new("widgets", "clock").is_ok());
    }
}
