use crate::paths;
use crate::validator::{Rule, RuleContext, Violation};
use regex::Regex;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static DEFAULT_EXPORT_RE: OnceLock<Regex> = OnceLock::new();
static REEXPORT_DEFAULT_RE: OnceLock<Regex> = OnceLock::new();
static NAMED_DECL_RE: OnceLock<Regex> = OnceLock::new();
static NAMED_REF_RE: OnceLock<Regex> = OnceLock::new();
static PASCAL_RE: OnceLock<Regex> = OnceLock::new();
static FROM_RE: OnceLock<Regex> = OnceLock::new();
static BARE_IMPORT_RE: OnceLock<Regex> = OnceLock::new();
static CALL_IMPORT_RE: OnceLock<Regex> = OnceLock::new();

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

fn default_export_re() -> &'static Regex {
    re(&DEFAULT_EXPORT_RE, r"\bexport\s+default\b")
}

fn reexport_default_re() -> &'static Regex {
    re(&REEXPORT_DEFAULT_RE, r"\bexport\s*\{[^}]*\bas\s+default\b")
}

fn named_decl_re() -> &'static Regex {
    re(
        &NAMED_DECL_RE,
        r"\bexport\s+default\s+(?:async\s+)?(?:function\s*\*?|class)\s+([A-Za-z_$][\w$]*)",
    )
}

fn named_ref_re() -> &'static Regex {
    re(&NAMED_REF_RE, r"\bexport\s+default\s+([A-Za-z_$][\w$]*)\s*;?\s*$")
}

fn pascal_re() -> &'static Regex {
    re(&PASCAL_RE, r"^[A-Z][A-Za-z0-9]*$")
}

fn from_re() -> &'static Regex {
    re(&FROM_RE, r#"\bfrom\s+['"]([^'"]+)['"]"#)
}

fn bare_import_re() -> &'static Regex {
    re(&BARE_IMPORT_RE, r#"^\s*import\s+['"]([^'"]+)['"]"#)
}

fn call_import_re() -> &'static Regex {
    re(
        &CALL_IMPORT_RE,
        r#"\b(?:require|import)\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
    )
}

/// 1-based column of byte offset `idx` in `line`.
fn column(line: &str, idx: usize) -> usize {
    line[..idx].chars().count() + 1
}

/// `(line, column)` of every default export in the file.
fn default_exports(ctx: &RuleContext) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    for (line_no, line) in ctx.code_lines.iter().map(|(n, l)| (*n, l.as_str())) {
        for m in default_export_re().find_iter(line) {
            found.push((line_no, column(line, m.start())));
        }
        for m in reexport_default_re().find_iter(line) {
            found.push((line_no, column(line, m.start())));
        }
    }
    found.sort();
    found
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn identity_naming(ctx: &RuleContext) -> Vec<Violation> {
    let id = &ctx.source.identity;
    let mut out = Vec::new();
    if !paths::is_slug(&id.category) {
        out.push(Violation::new(
            "identity-naming",
            format!("category '{}' must be lowercase kebab-case", id.category),
        ));
    }
    if !paths::is_slug(&id.name) {
        out.push(Violation::new(
            "identity-naming",
            format!("app name '{}' must be lowercase kebab-case", id.name),
        ));
    }
    out
}

fn non_empty(ctx: &RuleContext) -> Vec<Violation> {
    if ctx.source.text.trim().is_empty() {
        vec![Violation::new("non-empty", "file contains no code")]
    } else {
        Vec::new()
    }
}

fn max_size(ctx: &RuleContext) -> Vec<Violation> {
    let size = ctx.source.text.len();
    let limit = ctx.limits.max_bytes;
    if size > limit {
        vec![Violation::new(
            "max-size",
            format!("file is {size} bytes; the limit is {limit} bytes"),
        )]
    } else {
        Vec::new()
    }
}

fn single_default_export(ctx: &RuleContext) -> Vec<Violation> {
    let exports = default_exports(ctx);
    if exports.is_empty() {
        return vec![Violation::new(
            "default-export",
            "file must export exactly one default component; found none",
        )];
    }
    exports
        .iter()
        .skip(1)
        .map(|&(line, col)| {
            Violation::new(
                "default-export",
                format!(
                    "additional default export; the first is on line {}",
                    exports[0].0
                ),
            )
            .at(line, col)
        })
        .collect()
}

fn component_name(ctx: &RuleContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for (line_no, line) in ctx.code_lines.iter().map(|(n, l)| (*n, l.as_str())) {
        let captured = named_decl_re()
            .captures(line)
            .or_else(|| named_ref_re().captures(line))
            .and_then(|c| c.get(1));
        let Some(ident) = captured else {
            continue;
        };
        if matches!(ident.as_str(), "function" | "class" | "async") {
            continue;
        }
        if !pascal_re().is_match(ident.as_str()) {
            out.push(
                Violation::new(
                    "component-name",
                    format!(
                        "default-exported component '{}' must be PascalCase",
                        ident.as_str()
                    ),
                )
                .at(line_no, column(line, ident.start())),
            );
        }
    }
    out
}

fn disallowed_imports(ctx: &RuleContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for (line_no, line) in ctx.code_lines.iter().map(|(n, l)| (*n, l.as_str())) {
        let mut specifiers = Vec::new();
        for pattern in [from_re(), bare_import_re(), call_import_re()] {
            specifiers.extend(pattern.captures_iter(line).filter_map(|c| c.get(1)));
        }
        specifiers.sort_by_key(|m| m.start());

        for m in specifiers {
            if ctx.limits.is_disallowed(m.as_str()) {
                out.push(
                    Violation::new(
                        "disallowed-import",
                        format!("import of disallowed module '{}'", m.as_str()),
                    )
                    .at(line_no, column(line, m.start())),
                );
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Default rules (evaluation order)
// ---------------------------------------------------------------------------

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "identity-naming",
            description: "category and app name are lowercase kebab-case",
            check: identity_naming,
        },
        Rule {
            id: "non-empty",
            description: "file contains code",
            check: non_empty,
        },
        Rule {
            id: "max-size",
            description: "file does not exceed validation.max_bytes",
            check: max_size,
        },
        Rule {
            id: "default-export",
            description: "file has exactly one default export",
            check: single_default_export,
        },
        Rule {
            id: "component-name",
            description: "a named default export is PascalCase",
            check: component_name,
        },
        Rule {
            id: "disallowed-import",
            description: "no imports from validation.disallowed_imports",
            check: disallowed_imports,
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
