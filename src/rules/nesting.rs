//! Nesting-depth analyser (§4.5, C7): per-function max depth via an AST walk.

use super::{FileContext, Rule};
use crate::types::{Language, RuleId, Severity};
use crate::violation::build_violation;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tree_sitter::Node;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NestingConfig {
    pub max_depth: u32,
}

impl Default for NestingConfig {
    fn default() -> Self {
        Self { max_depth: 4 }
    }
}

const PYTHON_FUNCTION_KINDS: &[&str] = &["function_definition"];
const PYTHON_DEPTH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "else_clause",
    "for_statement",
    "while_statement",
    "with_statement",
    "try_statement",
    "except_clause",
    "match_statement",
    "case_clause",
];

const SCRIPT_FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "arrow_function",
    "method_definition",
    "generator_function_declaration",
];
const SCRIPT_DEPTH_KINDS: &[&str] = &[
    "if_statement",
    "else_clause",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "try_statement",
    "catch_clause",
    "switch_statement",
    "switch_case",
];

static RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("nesting.excessive-depth").expect("static rule id is valid"));

pub struct NestingDepthRule;

impl Rule for NestingDepthRule {
    fn id(&self) -> RuleId {
        RULE_ID.clone()
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Python, Language::TypeScript, Language::JavaScript]
    }

    fn check(&self, ctx: &FileContext, config: &serde_json::Value) -> Vec<crate::violation::Violation> {
        let Some(tree) = ctx.parsed.and_then(|p| p.as_tree_sitter()) else {
            return Vec::new();
        };
        let cfg: NestingConfig = serde_json::from_value(config.clone()).unwrap_or_default();

        let (function_kinds, depth_kinds): (&[&str], &[&str]) = match ctx.language {
            Language::Python => (PYTHON_FUNCTION_KINDS, PYTHON_DEPTH_KINDS),
            Language::TypeScript | Language::JavaScript => (SCRIPT_FUNCTION_KINDS, SCRIPT_DEPTH_KINDS),
            _ => return Vec::new(),
        };

        let mut functions = Vec::new();
        collect_function_nodes(tree.root_node(), function_kinds, &mut functions);

        let mut violations = Vec::new();
        for func in functions {
            let Some(body) = function_body(func, ctx.language) else {
                continue;
            };
            let (max_depth, deepest_row) = body_max_depth(body, depth_kinds, function_kinds);
            if max_depth > cfg.max_depth {
                violations.push(build_violation(
                    &self.id(),
                    ctx.canonical_path,
                    deepest_row as u32 + 1,
                    1,
                    format!(
                        "function body nests {max_depth} levels deep, exceeding the configured maximum of {}",
                        cfg.max_depth
                    ),
                    Some("extract nested branches into helper functions to flatten control flow".to_string()),
                    Severity::Error,
                ));
            }
        }
        violations
    }
}

fn collect_function_nodes<'a>(node: Node<'a>, function_kinds: &[&str], out: &mut Vec<Node<'a>>) {
    if function_kinds.contains(&node.kind()) {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_function_nodes(child, function_kinds, out);
    }
}

fn function_body(func: Node, language: Language) -> Option<Node> {
    let field = match language {
        Language::Python => "body",
        _ => "body",
    };
    func.child_by_field_name(field)
}

/// Whether `else_clause` is a chained `elif`/`else if` that should not add a
/// depth level beyond its containing `if` (§4.5).
fn is_chained_else_if(node: Node) -> bool {
    if node.kind() != "else_clause" {
        return false;
    }
    let mut cursor = node.walk();
    let named: Vec<Node> = node.children(&mut cursor).filter(|c| c.is_named()).collect();
    named.len() == 1 && named[0].kind() == "if_statement"
}

fn body_max_depth(body: Node, depth_kinds: &[&str], function_kinds: &[&str]) -> (u32, usize) {
    let mut max_depth = 1u32;
    let mut deepest_row = body.start_position().row;
    walk(body, 1, depth_kinds, function_kinds, &mut max_depth, &mut deepest_row);
    (max_depth, deepest_row)
}

fn walk(
    node: Node,
    depth: u32,
    depth_kinds: &[&str],
    function_kinds: &[&str],
    max_depth: &mut u32,
    deepest_row: &mut usize,
) {
    if depth > *max_depth {
        *max_depth = depth;
        *deepest_row = node.start_position().row;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if function_kinds.contains(&child.kind()) {
            // Nested function definitions reset depth to 1 and are analysed
            // as their own top-level unit by collect_function_nodes.
            continue;
        }
        let child_depth = if depth_kinds.contains(&child.kind()) && !is_chained_else_if(child) {
            depth + 1
        } else {
            depth
        };
        walk(child, child_depth, depth_kinds, function_kinds, max_depth, deepest_row);
    }
}
