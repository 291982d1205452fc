use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const APPDECK_DIR: &str = ".appdeck";
pub const APPS_DIR: &str = "apps";
pub const APP_EXTENSION: &str = "tsx";

pub const CONFIG_FILE: &str = ".appdeck/config.yaml";
pub const PHASES_FILE: &str = ".appdeck/phases.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn apps_dir(root: &Path) -> PathBuf {
    root.join(APPS_DIR)
}

pub fn category_dir(root: &Path, category: &str) -> PathBuf {
    apps_dir(root).join(category)
}

/// `apps/{category}/{name}.tsx`. Callers must have checked both segments
/// with [`is_safe_segment`] first.
pub fn app_source_path(root: &Path, category: &str, name: &str) -> PathBuf {
    category_dir(root, category).join(format!("{name}.{APP_EXTENSION}"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn phases_path(root: &Path) -> PathBuf {
    root.join(PHASES_FILE)
}

pub fn appdeck_dir(root: &Path) -> PathBuf {
    root.join(APPDECK_DIR)
}

// ---------------------------------------------------------------------------
// Segment checks
// ---------------------------------------------------------------------------

/// A segment is safe to join onto a directory: not empty, not `.`/`..`, no
/// separators, no drive prefix, no NUL.
pub fn is_safe_segment(segment: &str) -> bool {
    if segment.is_empty() || segment == "." || segment == ".." {
        return false;
    }
    if segment.contains(['/', '\\', '\0']) {
        return false;
    }
    // Windows drive prefix such as `C:`
    let bytes = segment.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return false;
    }
    true
}

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap())
}

/// Lowercase kebab-case, at most 64 characters.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty() && s.len() <= 64 && slug_re().is_match(s)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
