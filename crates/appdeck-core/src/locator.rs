use crate::error::{DeckError, Result};
use crate::paths;
use crate::types::{AppIdentity, AppSource};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// AppLocator
// ---------------------------------------------------------------------------

/// Maps app identities to source files under `{root}/apps`.
#[derive(Debug, Clone)]
pub struct AppLocator {
    root: PathBuf,
}

impl AppLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads the source text of `identity`.
    ///
    /// Segments are checked before a path is built, so an unsafe identity
    /// never touches the filesystem. The returned text is the file's bytes
    /// unchanged.
    pub fn resolve(&self, identity: &AppIdentity) -> Result<AppSource> {
        identity.check_segments()?;
        let path = paths::app_source_path(&self.root, &identity.category, &identity.name);

        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DeckError::NotFound { path });
            }
            Err(e) => {
                return Err(DeckError::Read {
                    path,
                    reason: e.to_string(),
                });
            }
        };
        let text = String::from_utf8(bytes).map_err(|e| DeckError::Read {
            path: path.clone(),
            reason: format!("not valid UTF-8: {e}"),
        })?;

        tracing::debug!(app = %identity, path = %path.display(), bytes = text.len(), "resolved app source");
        Ok(AppSource {
            identity: identity.clone(),
            path,
            text,
        })
    }

    /// Finds the category holding `{name}.tsx`.
    pub fn find(&self, name: &str) -> Result<AppIdentity> {
        if !paths::is_safe_segment(name) {
            return Err(DeckError::InvalidIdentity(name.to_string()));
        }
        let mut categories: Vec<String> = self
            .categories()?
            .into_iter()
            .filter(|c| paths::app_source_path(&self.root, c, name).is_file())
            .collect();

        match categories.len() {
            0 => Err(DeckError::NotFound {
                path: paths::apps_dir(&self.root)
                    .join("*")
                    .join(format!("{name}.{}", paths::APP_EXTENSION)),
            }),
            1 => AppIdentity::new(categories.remove(0), name),
            _ => {
                categories.sort();
                Err(DeckError::AmbiguousApp {
                    name: name.to_string(),
                    categories,
                })
            }
        }
    }

    /// Accepts either `category/name` or a bare `name`.
    pub fn lookup(&self, target: &str) -> Result<AppIdentity> {
        if target.contains('/') || target.contains('\\') {
            target.parse()
        } else {
            self.find(target)
        }
    }

    /// Every app in the catalog, sorted by category then name.
    pub fn list(&self) -> Result<Vec<AppIdentity>> {
        let mut apps = Vec::new();
        for category in self.categories()? {
            let dir = paths::category_dir(&self.root, &category);
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some(paths::APP_EXTENSION) {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if let Ok(identity) = AppIdentity::new(category.clone(), name) {
                    apps.push(identity);
                }
            }
        }
        apps.sort();
        Ok(apps)
    }

    fn categories(&self) -> Result<Vec<String>> {
        let dir = paths::apps_dir(&self.root);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if paths::is_safe_segment(name) {
                    out.push(name.to_string());
                }
            }
        }
        out.sort();
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
