use crate::config::ValidationConfig;
use crate::rules::default_rules;
use crate::types::AppSource;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Violation / ValidationResult (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Violation {
    pub fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "[{}] {}:{} {}", self.rule, line, col, self.message),
            _ => write!(f, "[{}] {}", self.rule, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }
}

// ---------------------------------------------------------------------------
// RuleContext
// ---------------------------------------------------------------------------

pub struct RuleContext<'a> {
    pub source: &'a AppSource,
    pub limits: &'a ValidationConfig,
    /// `(1-based line number, line)` for every line with code, comments
    /// blanked to spaces.
    pub code_lines: Vec<(usize, String)>,
}

impl<'a> RuleContext<'a> {
    pub fn new(source: &'a AppSource, limits: &'a ValidationConfig) -> Self {
        Self {
            source,
            limits,
            code_lines: code_lines(&source.text),
        }
    }
}

/// Every line with code left after comments are blanked out.
fn code_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut in_block = false;
    for (i, line) in text.lines().enumerate() {
        let code = strip_comments(line, &mut in_block);
        if !code.trim().is_empty() {
            out.push((i + 1, code));
        }
    }
    out
}

/// Replaces comment text with spaces so columns still line up. `in_block`
/// carries an unterminated `/* ... */` into the next line. Comment markers
/// inside string literals are left alone.
fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if *in_block {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block = false;
                out.push_str("  ");
            } else {
                out.push(' ');
            }
            continue;
        }
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match (c, chars.peek().copied()) {
            ('/', Some('/')) => break,
            ('/', Some('*')) => {
                chars.next();
                *in_block = true;
                out.push_str("  ");
            }
            ('\'' | '"' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule. Each rule sees the whole file and returns every
/// violation it finds.
pub struct Rule {
    pub id: &'static str,
    pub description: &'static str,
    pub check: fn(&RuleContext) -> Vec<Violation>,
}

// ---------------------------------------------------------------------------
// StructureValidator
// ---------------------------------------------------------------------------

pub struct StructureValidator {
    rules: Vec<Rule>,
    limits: ValidationConfig,
}

impl StructureValidator {
    pub fn new(limits: ValidationConfig) -> Self {
        Self::with_rules(default_rules(), limits)
    }

    pub fn with_rules(rules: Vec<Rule>, limits: ValidationConfig) -> Self {
        Self { rules, limits }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs every rule, in order, with no short-circuit.
    pub fn validate(&self, source: &AppSource) -> ValidationResult {
        let ctx = RuleContext::new(source, &self.limits);
        let mut violations = Vec::new();
        for rule in &self.rules {
            let found = (rule.check)(&ctx);
            if !found.is_empty() {
                tracing::debug!(rule = rule.id, count = found.len(), app = %source.identity, "rule failed");
            }
            violations.extend(found);
        }
        ValidationResult::from_violations(violations)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
