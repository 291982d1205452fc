use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// DeployConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Base URL of the hosting service, e.g. `https://apps.example.dev`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Bearer token. Never written back to disk.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: default_timeout_seconds(),
            token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PhaseConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Lifecycle stages, lowest first.
    #[serde(default = "default_phase_order")]
    pub order: Vec<String>,
}

fn default_phase_order() -> Vec<String> {
    vec!["draft".to_string(), "reviewed".to_string(), "live".to_string()]
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            order: default_phase_order(),
        }
    }
}

// ---------------------------------------------------------------------------
// PromptConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Maximum bytes of source embedded in a prompt.
    #[serde(default = "default_excerpt_limit")]
    pub excerpt_limit: usize,
    /// Phase name -> instruction template. `{name}`, `{category}` and
    /// `{phase}` are substituted.
    #[serde(default = "default_templates")]
    pub templates: BTreeMap<String, String>,
}

fn default_excerpt_limit() -> usize {
    4000
}

fn default_templates() -> BTreeMap<String, String> {
    let mut m = BTreeMap::new();
    m.insert(
        "draft".to_string(),
        "Build out '{name}' in the '{category}' category. Flesh out the core \
         interaction, keep everything in this single file, and keep exactly one \
         default-exported component."
            .to_string(),
    );
    m.insert(
        "reviewed".to_string(),
        "'{name}' ({category}) has passed review. Polish the visuals, tighten \
         edge cases, and remove dead code without changing its public behavior."
            .to_string(),
    );
    m.insert(
        "live".to_string(),
        "'{name}' ({category}) is live. Make only small, safe improvements and \
         fix reported bugs; do not restructure the component."
            .to_string(),
    );
    m
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            excerpt_limit: default_excerpt_limit(),
            templates: default_templates(),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Module names an app may not import. A trailing `*` matches by prefix.
    #[serde(default = "default_disallowed_imports")]
    pub disallowed_imports: Vec<String>,
}

fn default_max_bytes() -> usize {
    64 * 1024
}

fn default_disallowed_imports() -> Vec<String> {
    ["fs", "child_process", "net", "os", "path", "node:*"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            disallowed_imports: default_disallowed_imports(),
        }
    }
}

impl ValidationConfig {
    pub fn is_disallowed(&self, module: &str) -> bool {
        self.disallowed_imports.iter().any(|entry| {
            match entry.strip_suffix('*') {
                Some(prefix) => module.starts_with(prefix),
                None => module == entry,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub phases: PhaseConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            deploy: DeployConfig::default(),
            phases: PhaseConfig::default(),
            prompts: PromptConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Config {
    /// Loads `.appdeck/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Writes this config to `.appdeck/config.yaml` unless one already
    /// exists. Returns whether a file was written.
    pub fn init(&self, root: &Path) -> Result<bool> {
        let data = serde_yaml::to_string(self)?;
        crate::io::write_new(&paths::config_path(root), data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Phase order must be non-empty and free of duplicates
        if self.phases.order.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "phases.order is empty; at least one phase is required".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for phase in &self.phases.order {
            if !seen.insert(phase.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("phase '{phase}' appears more than once in phases.order"),
                });
            }
        }

        // 2. Templates and phases should line up
        for key in self.prompts.templates.keys() {
            if !self.phases.order.contains(key) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("template for unknown phase '{key}' in prompts.templates"),
                });
            }
        }
        for phase in &self.phases.order {
            if !self.prompts.templates.contains_key(phase) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "phase '{phase}' has no prompt template; 'prompt' will fail in this phase"
                    ),
                });
            }
        }

        // 3. Endpoint shape
        if let Some(endpoint) = &self.deploy.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("deploy.endpoint '{endpoint}' is not an http(s) URL"),
                });
            }
        }

        // 4. A zero size limit rejects every app
        if self.validation.max_bytes == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "validation.max_bytes is 0; every app will fail the size rule".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
