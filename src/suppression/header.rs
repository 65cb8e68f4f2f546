//! Parsing of the file-header `Suppressions:` section (§4.3, C13): a
//! docstring for Python, a leading comment block for TS/JS/Bash/CSS, or a
//! `suppressions` map in YAML frontmatter for Markdown.

use crate::parsing::markdown::MarkdownDoc;
use crate::types::{Language, RuleId};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct HeaderSuppression {
    pub rule_id: RuleId,
    pub justification: String,
    /// 1-based line of the header that declared this suppression.
    pub declared_line: u32,
}

static ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z0-9_.-]+)\s*:\s*(.+)$").unwrap());

/// Extracts the raw text of the leading header block along with the
/// 1-based source line each extracted line came from.
fn leading_header_block(language: Language, content: &str) -> Vec<(u32, String)> {
    let mut lines: Vec<(u32, String)> = Vec::new();
    let mut iter = content.lines().enumerate().peekable();

    if language == Language::Bash {
        if let Some((_, first)) = iter.peek() {
            if first.starts_with("#!") {
                iter.next();
            }
        }
    }

    match language {
        Language::Python => {
            let mut started = false;
            let mut quote = "";
            for (idx, line) in iter {
                let trimmed = line.trim();
                if !started {
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Some(q) = ["\"\"\"", "'''"].into_iter().find(|q| trimmed.starts_with(q)) {
                        started = true;
                        quote = q;
                        let rest = &trimmed[q.len()..];
                        if rest.ends_with(q) && !rest.is_empty() {
                            lines.push((idx as u32 + 1, rest[..rest.len() - q.len()].to_string()));
                            break;
                        }
                        lines.push((idx as u32 + 1, rest.to_string()));
                        continue;
                    }
                    break;
                }
                if trimmed.ends_with(quote) {
                    lines.push((idx as u32 + 1, trimmed[..trimmed.len() - quote.len()].to_string()));
                    break;
                }
                lines.push((idx as u32 + 1, line.to_string()));
            }
        }
        Language::TypeScript | Language::JavaScript | Language::Css => {
            let mut in_block = false;
            for (idx, line) in iter {
                let trimmed = line.trim();
                if !in_block {
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Some(rest) = trimmed.strip_prefix("/*") {
                        in_block = true;
                        if let Some(end) = rest.find("*/") {
                            lines.push((idx as u32 + 1, rest[..end].to_string()));
                            break;
                        }
                        lines.push((idx as u32 + 1, rest.to_string()));
                        continue;
                    }
                    if let Some(rest) = trimmed.strip_prefix("//") {
                        lines.push((idx as u32 + 1, rest.to_string()));
                        continue;
                    }
                    break;
                }
                if let Some(end) = trimmed.find("*/") {
                    lines.push((idx as u32 + 1, trimmed[..end].to_string()));
                    break;
                }
                lines.push((idx as u32 + 1, line.to_string()));
            }
        }
        Language::Bash => {
            for (idx, line) in iter {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let Some(rest) = trimmed.strip_prefix('#') else {
                    break;
                };
                lines.push((idx as u32 + 1, rest.to_string()));
            }
        }
        Language::Markdown | Language::Other => {}
    }

    lines
}

fn parse_suppressions_block(lines: &[(u32, String)]) -> Vec<HeaderSuppression> {
    let mut out = Vec::new();
    let mut in_section = false;
    for (line_no, text) in lines {
        let trimmed = text.trim();
        if !in_section {
            if trimmed.eq_ignore_ascii_case("suppressions:") {
                in_section = true;
            }
            continue;
        }
        if trimmed.is_empty() {
            break;
        }
        let Some(caps) = ENTRY.captures(trimmed) else {
            break;
        };
        let Some(rule_id) = RuleId::new(&caps[1]) else {
            continue;
        };
        let justification = caps[2].trim().to_string();
        if justification.is_empty() {
            // §4.3: every entry requires a non-empty justification.
            continue;
        }
        out.push(HeaderSuppression {
            rule_id,
            justification,
            declared_line: *line_no,
        });
    }
    out
}

/// Parses header suppressions for the comment/docstring-bearing languages.
/// Markdown goes through [`parse_markdown_header_suppressions`] instead,
/// since its header lives in structured YAML frontmatter.
pub fn parse_header_suppressions(language: Language, content: &str) -> Vec<HeaderSuppression> {
    let lines = leading_header_block(language, content);
    parse_suppressions_block(&lines)
}

pub fn parse_markdown_header_suppressions(doc: &MarkdownDoc) -> Vec<HeaderSuppression> {
    let Some(serde_yaml::Value::Mapping(frontmatter)) = &doc.frontmatter else {
        return Vec::new();
    };
    let suppressions_value = frontmatter
        .iter()
        .find(|(k, _)| k.as_str() == Some("suppressions"))
        .map(|(_, v)| v);
    let Some(serde_yaml::Value::Mapping(suppressions)) = suppressions_value else {
        return Vec::new();
    };
    suppressions
        .iter()
        .filter_map(|(key, value)| {
            let rule_id = RuleId::new(key.as_str()?)?;
            let justification = value.as_str()?.trim().to_string();
            if justification.is_empty() {
                return None;
            }
            Some(HeaderSuppression {
                rule_id,
                justification,
                declared_line: doc.body_start_line.saturating_sub(1).max(1),
            })
        })
        .collect()
}
