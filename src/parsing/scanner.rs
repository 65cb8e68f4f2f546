//! Regex-driven comment/token scanner for Bash and CSS (§4.2).
//!
//! Neither language gets a full parse tree in this core; instead each file is
//! split into a flat stream of comment and code tokens with line spans. This
//! is enough for the rules that do run against these languages (DRY
//! tokenization, suppression directive recognition over raw bytes).

use crate::types::Language;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTokenKind {
    Comment,
    Word,
    Number,
    String,
    Operator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanToken {
    pub kind: ScanTokenKind,
    pub text: String,
    /// 1-based.
    pub line: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub tokens: Vec<ScanToken>,
}

impl ScanResult {
    /// Tokens outside of comments, in source order — the input to DRY tokenization.
    pub fn code_tokens(&self) -> impl Iterator<Item = &ScanToken> {
        self.tokens.iter().filter(|t| t.kind != ScanTokenKind::Comment)
    }
}

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?").unwrap());
static STRING_SQ: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'([^'\\]|\\.)*'").unwrap());
static STRING_DQ: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"([^"\\]|\\.)*""#).unwrap());

pub fn scan(language: Language, content: &str) -> ScanResult {
    let comment_starts: &[&str] = match language {
        Language::Bash => &["#"],
        Language::Css => &["/*"],
        _ => &[],
    };

    let mut tokens = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx as u32 + 1;
        scan_line(line, line_no, comment_starts, language, &mut tokens);
    }
    ScanResult { tokens }
}

fn scan_line(
    line: &str,
    line_no: u32,
    comment_starts: &[&str],
    language: Language,
    out: &mut Vec<ScanToken>,
) {
    let mut rest = line;
    loop {
        let trimmed = rest.trim_start();
        let consumed = rest.len() - trimmed.len();
        rest = trimmed;
        if rest.is_empty() {
            return;
        }

        if language == Language::Css {
            if let Some(end) = rest.find("*/") {
                out.push(ScanToken {
                    kind: ScanTokenKind::Comment,
                    text: rest[..end + 2].to_string(),
                    line: line_no,
                });
                rest = &rest[end + 2..];
                continue;
            }
            if rest.starts_with("/*") {
                out.push(ScanToken {
                    kind: ScanTokenKind::Comment,
                    text: rest.to_string(),
                    line: line_no,
                });
                return;
            }
        }

        if comment_starts
            .iter()
            .any(|sigil| rest.starts_with(sigil) && language == Language::Bash)
        {
            out.push(ScanToken {
                kind: ScanTokenKind::Comment,
                text: rest.to_string(),
                line: line_no,
            });
            return;
        }

        if let Some(m) = STRING_DQ.find(rest) {
            out.push(ScanToken {
                kind: ScanTokenKind::String,
                text: m.as_str().to_string(),
                line: line_no,
            });
            rest = &rest[m.end()..];
            continue;
        }
        if let Some(m) = STRING_SQ.find(rest) {
            out.push(ScanToken {
                kind: ScanTokenKind::String,
                text: m.as_str().to_string(),
                line: line_no,
            });
            rest = &rest[m.end()..];
            continue;
        }
        if let Some(m) = NUMBER.find(rest) {
            out.push(ScanToken {
                kind: ScanTokenKind::Number,
                text: m.as_str().to_string(),
                line: line_no,
            });
            rest = &rest[m.end()..];
            continue;
        }
        if let Some(m) = WORD.find(rest) {
            out.push(ScanToken {
                kind: ScanTokenKind::Word,
                text: m.as_str().to_string(),
                line: line_no,
            });
            rest = &rest[m.end()..];
            continue;
        }

        // A single operator/punctuation character.
        let mut chars = rest.char_indices();
        let (_, c) = chars.next().unwrap();
        let next_idx = chars.next().map(|(i, _)| i).unwrap_or(rest.len());
        out.push(ScanToken {
            kind: ScanTokenKind::Operator,
            text: c.to_string(),
            line: line_no,
        });
        rest = &rest[next_idx..];
        let _ = consumed;
    }
}
