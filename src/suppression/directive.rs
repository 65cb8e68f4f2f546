//! Recognition of `BLOCK` and `LINE` scoped suppression comments (§4.3).
//!
//! Directives are matched against raw file bytes, not the parsed tree,
//! because a parser may elide the comments that carry them.

use crate::types::{Language, RuleId};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Start,
    End,
    Line,
}

#[derive(Debug, Clone)]
pub struct RawDirective {
    pub kind: DirectiveKind,
    /// Empty means "every rule on this scope" (§4.3 invariant ii).
    pub rule_ids: Vec<RuleId>,
    /// 1-based.
    pub line: u32,
}

static HASH_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\s*thailint:\s*ignore(-start|-end)?(?:\[([^\]]*)\])?").unwrap());
static SLASH_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//\s*thailint:\s*ignore(-start|-end)?(?:\[([^\]]*)\])?").unwrap());
static HTML_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s*thailint:\s*ignore(-start|-end)?(?:\[([^\]]*)\])?\s*-->").unwrap()
});

/// The legacy, DRY-only spelling (§9 open question: `# dry: ignore-block` /
/// `# dry: ignore-end` are equivalent to `# thailint: ignore-start[dry]` /
/// `# thailint: ignore-end`). Same sigil family per language, separate
/// pattern since the keyword and block-vs-start spelling both differ from
/// the unified form.
static LEGACY_DRY_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s*dry:\s*ignore-(block|end)").unwrap());
static LEGACY_DRY_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"//\s*dry:\s*ignore-(block|end)").unwrap());
static LEGACY_DRY_HTML: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*dry:\s*ignore-(block|end)\s*-->").unwrap());

fn sigil_for(language: Language) -> &'static Regex {
    match language {
        Language::Python | Language::Bash => &HASH_DIRECTIVE,
        Language::TypeScript | Language::JavaScript | Language::Css => &SLASH_DIRECTIVE,
        Language::Markdown => &HTML_DIRECTIVE,
        Language::Other => &HASH_DIRECTIVE,
    }
}

fn legacy_dry_sigil_for(language: Language) -> &'static Regex {
    match language {
        Language::Python | Language::Bash => &LEGACY_DRY_HASH,
        Language::TypeScript | Language::JavaScript | Language::Css => &LEGACY_DRY_SLASH,
        Language::Markdown => &LEGACY_DRY_HTML,
        Language::Other => &LEGACY_DRY_HASH,
    }
}

/// Scans every line of `content` for a suppression directive comment,
/// in the sigil family appropriate to `language`. The unified `thailint:`
/// form is tried first; a line that doesn't match it falls back to the
/// legacy `dry:` spelling.
pub fn scan_line_directives(language: Language, content: &str) -> Vec<RawDirective> {
    let re = sigil_for(language);
    let legacy = legacy_dry_sigil_for(language);
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if let Some(caps) = re.captures(line) {
            let kind = match caps.get(1).map(|m| m.as_str()) {
                Some("-start") => DirectiveKind::Start,
                Some("-end") => DirectiveKind::End,
                _ => DirectiveKind::Line,
            };
            let rule_ids = caps
                .get(2)
                .map(|m| parse_rule_list(m.as_str()))
                .unwrap_or_default();
            out.push(RawDirective {
                kind,
                rule_ids,
                line: idx as u32 + 1,
            });
            continue;
        }
        if let Some(caps) = legacy.captures(line) {
            let kind = match caps.get(1).map(|m| m.as_str()) {
                Some("end") => DirectiveKind::End,
                _ => DirectiveKind::Start,
            };
            let rule_ids = match kind {
                DirectiveKind::Start => vec![RuleId::new("dry").expect("static rule id is valid")],
                _ => Vec::new(),
            };
            out.push(RawDirective {
                kind,
                rule_ids,
                line: idx as u32 + 1,
            });
        }
    }
    out
}

/// Rule-id comparison is case-insensitive (§4.3); `RuleId::new` already
/// lower-cases, so a simple per-entry parse gets this for free.
fn parse_rule_list(raw: &str) -> Vec<RuleId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(RuleId::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_python_line_directive_with_rule_list() {
        let directives = scan_line_directives(Language::Python, "x = 1  # thailint: ignore[nesting,srp]\n");
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].kind, DirectiveKind::Line);
        assert_eq!(directives[0].rule_ids.len(), 2);
    }

    #[test]
    fn empty_rule_list_means_all_rules() {
        let directives = scan_line_directives(Language::TypeScript, "foo(); // thailint: ignore\n");
        assert!(directives[0].rule_ids.is_empty());
    }

    #[test]
    fn recognises_block_start_and_end() {
        let content = "// thailint: ignore-start[nesting]\nfoo();\n// thailint: ignore-end\n";
        let directives = scan_line_directives(Language::JavaScript, content);
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].kind, DirectiveKind::Start);
        assert_eq!(directives[1].kind, DirectiveKind::End);
    }

    #[test]
    fn markdown_uses_html_comment_sigil() {
        let directives = scan_line_directives(Language::Markdown, "<!-- thailint: ignore[md.rule] -->\n");
        assert_eq!(directives.len(), 1);
    }

    #[test]
    fn legacy_dry_block_spelling_is_equivalent_to_unified_form() {
        let legacy = "# dry: ignore-block\ntotal = compute(a, b)\n# dry: ignore-end\n";
        let unified = "# thailint: ignore-start[dry]\ntotal = compute(a, b)\n# thailint: ignore-end\n";

        let legacy_directives = scan_line_directives(Language::Python, legacy);
        let unified_directives = scan_line_directives(Language::Python, unified);

        assert_eq!(legacy_directives.len(), 2);
        assert_eq!(legacy_directives[0].kind, DirectiveKind::Start);
        assert_eq!(legacy_directives[0].rule_ids[0].as_str(), "dry");
        assert_eq!(legacy_directives[1].kind, DirectiveKind::End);

        assert_eq!(legacy_directives.len(), unified_directives.len());
        assert_eq!(legacy_directives[0].kind, unified_directives[0].kind);
        assert_eq!(legacy_directives[0].rule_ids.len(), unified_directives[0].rule_ids.len());
    }
}
