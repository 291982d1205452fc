use crate::config::PromptConfig;
use crate::error::{DeckError, Result};
use crate::paths;
use crate::phase::Phase;
use crate::types::{AppIdentity, AppSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// PromptPayload
// ---------------------------------------------------------------------------

/// Self-contained prompt handed to the content generator. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub identity: AppIdentity,
    pub phase: Phase,
    pub instructions: String,
    pub source_excerpt: String,
    /// Size of the full source, so consumers can tell how much was cut.
    pub source_bytes: usize,
    pub truncated: bool,
}

impl PromptPayload {
    /// Markdown rendering. Deterministic for a given payload.
    pub fn render(&self) -> String {
        let mut doc = String::new();
        let source_path = format!(
            "{}/{}/{}.{}",
            paths::APPS_DIR,
            self.identity.category,
            self.identity.name,
            paths::APP_EXTENSION
        );

        doc.push_str(&format!("# Prompt: {}\n\n", self.identity));
        doc.push_str(&format!("**App:** {}\n", self.identity.name));
        doc.push_str(&format!("**Category:** {}\n", self.identity.category));
        doc.push_str(&format!("**Phase:** {}\n", self.phase));
        doc.push_str(&format!("**Source:** `{source_path}`\n\n"));

        doc.push_str("## Instructions\n\n");
        doc.push_str(&self.instructions);
        doc.push('\n');

        doc.push_str("\n## Current Source\n\n");
        let fence = fence_for(&self.source_excerpt);
        doc.push_str(&format!("{fence}{}\n", paths::APP_EXTENSION));
        doc.push_str(&self.source_excerpt);
        if !self.source_excerpt.ends_with('\n') {
            doc.push('\n');
        }
        doc.push_str(&fence);
        doc.push('\n');

        if self.truncated {
            doc.push_str(&format!(
                "\n_Excerpt truncated: showing {} of {} bytes._\n",
                self.source_excerpt.len(),
                self.source_bytes
            ));
        }
        doc
    }
}

/// A backtick fence longer than any backtick run inside `text`.
fn fence_for(text: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat(longest.max(2) + 1)
}

// ---------------------------------------------------------------------------
// PromptGenerator
// ---------------------------------------------------------------------------

pub struct PromptGenerator {
    templates: BTreeMap<String, String>,
    excerpt_limit: usize,
}

impl PromptGenerator {
    pub fn new(templates: BTreeMap<String, String>, excerpt_limit: usize) -> Self {
        Self {
            templates,
            excerpt_limit,
        }
    }

    pub fn from_config(cfg: &PromptConfig) -> Self {
        Self::new(cfg.templates.clone(), cfg.excerpt_limit)
    }

    pub fn has_template(&self, phase: &str) -> bool {
        self.templates.contains_key(phase)
    }

    /// Pure function of `(source, phase)` and the generator's templates.
    pub fn generate(&self, source: &AppSource, phase: &Phase) -> Result<PromptPayload> {
        let template = self
            .templates
            .get(&phase.name)
            .ok_or_else(|| DeckError::UnknownPhase(phase.name.clone()))?;

        let instructions = template
            .replace("{name}", &source.identity.name)
            .replace("{category}", &source.identity.category)
            .replace("{phase}", &phase.name);

        let (excerpt, truncated) = excerpt(&source.text, self.excerpt_limit);
        Ok(PromptPayload {
            identity: source.identity.clone(),
            phase: phase.clone(),
            instructions,
            source_excerpt: excerpt.to_string(),
            source_bytes: source.text.len(),
            truncated,
        })
    }
}

/// Longest prefix of at most `limit` bytes that ends on a char boundary.
fn excerpt(text: &str, limit: usize) -> (&str, bool) {
    if text.len() <= limit {
        return (text, false);
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
