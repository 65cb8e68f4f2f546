//! Tokenisation and k-gram fingerprinting for the DRY detector (§4.7).

use crate::hash::fingerprint_tokens;
use crate::parsing::scanner::{ScanToken, ScanTokenKind};
use crate::parsing::ParsedTree;
use tree_sitter::Node;

/// A single normalised token: identifiers collapse to `ID`, literals to
/// `LIT`, comments and whitespace are dropped, operators pass through
/// verbatim (§4.7 step 1).
#[derive(Debug, Clone)]
pub struct NormToken {
    pub value: String,
    /// 1-based.
    pub line: u32,
}

pub fn tokenize(parsed: &ParsedTree, source: &str) -> Vec<NormToken> {
    match parsed {
        ParsedTree::Python(tree) | ParsedTree::Script(tree) => {
            let mut out = Vec::new();
            walk_leaves(tree.root_node(), source.as_bytes(), &mut out);
            out
        }
        ParsedTree::Scanned(scan) => scan
            .code_tokens()
            .map(|t| NormToken {
                value: normalize_scan_token(t),
                line: t.line,
            })
            .collect(),
        ParsedTree::Markdown(_) => Vec::new(),
    }
}

fn walk_leaves(node: Node, source: &[u8], out: &mut Vec<NormToken>) {
    if node.child_count() == 0 {
        if node.kind() == "comment" {
            return;
        }
        let Ok(text) = node.utf8_text(source) else {
            return;
        };
        if text.trim().is_empty() {
            return;
        }
        out.push(NormToken {
            value: normalize_leaf(node.kind(), text),
            line: node.start_position().row as u32 + 1,
        });
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_leaves(child, source, out);
    }
}

fn normalize_leaf(kind: &str, text: &str) -> String {
    match kind {
        "identifier" | "property_identifier" | "shorthand_property_identifier" | "type_identifier" => {
            "ID".to_string()
        }
        "integer" | "float" | "number" | "string" | "string_content" | "true" | "false" | "none" | "null" => {
            "LIT".to_string()
        }
        _ => text.to_string(),
    }
}

fn normalize_scan_token(token: &ScanToken) -> String {
    match token.kind {
        ScanTokenKind::Word => "ID".to_string(),
        ScanTokenKind::Number | ScanTokenKind::String => "LIT".to_string(),
        ScanTokenKind::Operator => token.text.clone(),
        ScanTokenKind::Comment => String::new(),
    }
}

/// One k-gram fingerprint: a hash plus the file-relative line span it covers.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprint {
    pub hash: u64,
    pub start_line: u32,
    pub end_line: u32,
}

/// Emits every contiguous window of exactly `min_tokens` tokens as a k-gram
/// (§4.7 step 2-3). A file shorter than `min_tokens` produces no fingerprints.
pub fn fingerprints(tokens: &[NormToken], min_tokens: usize) -> Vec<Fingerprint> {
    if min_tokens == 0 || tokens.len() < min_tokens {
        return Vec::new();
    }
    let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
    let mut out = Vec::with_capacity(tokens.len() - min_tokens + 1);
    for start in 0..=(tokens.len() - min_tokens) {
        let window = &values[start..start + min_tokens];
        out.push(Fingerprint {
            hash: fingerprint_tokens(window),
            start_line: tokens[start].line,
            end_line: tokens[start + min_tokens - 1].line,
        });
    }
    out
}
