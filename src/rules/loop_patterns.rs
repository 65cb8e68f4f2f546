//! Loop anti-pattern rule family (§4.9, C11): three independently
//! configurable rules sharing one AST walk over loop bodies. All three emit
//! under the `performance.*` namespace.

use super::{FileContext, Rule};
use crate::types::{Language, RuleId, Severity};
use crate::violation::{build_violation, Violation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use tree_sitter::Node;

const LOOP_KINDS: &[&str] = &["for_statement", "while_statement", "for_in_statement", "do_statement"];

fn collect_loops<'a>(node: Node<'a>, out: &mut Vec<Node<'a>>) {
    if LOOP_KINDS.contains(&node.kind()) {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_loops(child, out);
    }
}

/// Walks `node`'s subtree but does not descend into a nested loop — a nested
/// loop is analysed separately as its own top-level entry from
/// [`collect_loops`], so descending here would double-attribute its body.
fn walk_without_nested_loops<'a>(node: Node<'a>, visit: &mut impl FnMut(Node<'a>)) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child);
        if LOOP_KINDS.contains(&child.kind()) {
            continue;
        }
        walk_without_nested_loops(child, visit);
    }
}

fn loop_body(node: Node) -> Option<Node> {
    node.child_by_field_name("body")
}

fn collect_identifier_names(node: Node, source: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    if node.kind() == "identifier" {
        if let Ok(text) = node.utf8_text(source) {
            out.push(text.to_string());
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        out.extend(collect_identifier_names(child, source));
    }
    out
}

fn loop_iteration_variables(loop_node: Node, source: &[u8]) -> Vec<String> {
    match loop_node.kind() {
        "for_statement" | "for_in_statement" => loop_node
            .child_by_field_name("left")
            .map(|target| collect_identifier_names(target, source))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------
// performance.call-in-loop
// ---------------------------------------------------------------------

static CALL_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("performance.call-in-loop").expect("static rule id is valid"));

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallInLoopConfig {
    pub enabled: bool,
    pub allow_list: Vec<String>,
}

impl Default for CallInLoopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_list: Vec::new(),
        }
    }
}

pub struct CallInLoopRule;

impl Rule for CallInLoopRule {
    fn id(&self) -> RuleId {
        CALL_RULE_ID.clone()
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Python, Language::TypeScript, Language::JavaScript]
    }

    fn check(&self, ctx: &FileContext, config: &serde_json::Value) -> Vec<Violation> {
        let Some(tree) = ctx.parsed.and_then(|p| p.as_tree_sitter()) else {
            return Vec::new();
        };
        let cfg: CallInLoopConfig = serde_json::from_value(config.clone()).unwrap_or_default();
        if !cfg.enabled {
            return Vec::new();
        }
        let source = ctx.text.as_bytes();
        let call_kind = if ctx.language == Language::Python { "call" } else { "call_expression" };

        let mut loops = Vec::new();
        collect_loops(tree.root_node(), &mut loops);

        let mut violations = Vec::new();
        for loop_node in loops {
            let Some(body) = loop_body(loop_node) else { continue };
            let iter_vars = loop_iteration_variables(loop_node, source);
            if iter_vars.is_empty() {
                continue;
            }
            let mut calls = Vec::new();
            walk_without_nested_loops(body, &mut |n| {
                if n.kind() == "expression_statement" {
                    if let Some(child) = n.named_child(0) {
                        if child.kind() == call_kind {
                            calls.push(child);
                        }
                    }
                }
            });
            for call in calls {
                let Some(func) = call.child_by_field_name("function") else { continue };
                let Ok(callee_name) = func.utf8_text(source) else { continue };
                if cfg.allow_list.iter().any(|a| a == callee_name) {
                    continue;
                }
                let Some(args) = call.child_by_field_name("arguments") else { continue };
                let arg_names = collect_identifier_names(args, source);
                if iter_vars.iter().any(|v| arg_names.contains(v)) {
                    violations.push(build_violation(
                        &self.id(),
                        ctx.canonical_path,
                        call.start_position().row as u32 + 1,
                        1,
                        format!("call to '{callee_name}' discards its result and runs once per loop iteration"),
                        Some("batch these calls outside the loop instead of invoking one per iteration".to_string()),
                        Severity::Error,
                    ));
                }
            }
        }
        violations
    }
}

// ---------------------------------------------------------------------
// performance.string-concat-loop
// ---------------------------------------------------------------------

static CONCAT_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("performance.string-concat-loop").expect("static rule id is valid"));

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StringConcatConfig {
    pub enabled: bool,
    pub report_each_concat: bool,
    pub hint_substrings: Vec<String>,
}

impl Default for StringConcatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            report_each_concat: false,
            hint_substrings: [
                "str", "msg", "text", "html", "result", "output", "content", "line", "url", "sql", "json", "xml",
                "csv", "body", "response",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

pub struct StringConcatInLoopRule;

static EMPTY_STRING_INIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(""|'')\s*$"#).unwrap());

/// Textual heuristic for "the loop-enclosing initialiser assigns `x = ""`"
/// (§4.5): scans lines before the loop rather than tracking lexical scope.
fn preloop_empty_string_names(text: &str, loop_start_row: usize) -> HashSet<String> {
    text.lines()
        .take(loop_start_row)
        .filter_map(|line| EMPTY_STRING_INIT.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

fn python_concat_target(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "augmented_assignment" => {
            let op = node.child_by_field_name("operator")?.utf8_text(source).ok()?;
            if op != "+=" {
                return None;
            }
            let left = node.child_by_field_name("left")?;
            if left.kind() != "identifier" {
                return None;
            }
            Some(left.utf8_text(source).ok()?.to_string())
        }
        "assignment" => {
            let left = node.child_by_field_name("left")?;
            if left.kind() != "identifier" {
                return None;
            }
            let left_name = left.utf8_text(source).ok()?;
            let right = node.child_by_field_name("right")?;
            if right.kind() != "binary_operator" {
                return None;
            }
            let op = right.child_by_field_name("operator")?.utf8_text(source).ok()?;
            let rl = right.child_by_field_name("left")?;
            if op == "+" && rl.kind() == "identifier" && rl.utf8_text(source).ok()? == left_name {
                Some(left_name.to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn script_concat_target(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() != "assignment_expression" {
        return None;
    }
    let op = node.child_by_field_name("operator")?.utf8_text(source).ok()?;
    let left = node.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let left_name = left.utf8_text(source).ok()?;
    if op == "+=" {
        return Some(left_name.to_string());
    }
    if op == "=" {
        let right = node.child_by_field_name("right")?;
        if right.kind() != "binary_expression" {
            return None;
        }
        let rop = right.child_by_field_name("operator")?.utf8_text(source).ok()?;
        let rl = right.child_by_field_name("left")?;
        if rop == "+" && rl.kind() == "identifier" && rl.utf8_text(source).ok()? == left_name {
            return Some(left_name.to_string());
        }
    }
    None
}

impl Rule for StringConcatInLoopRule {
    fn id(&self) -> RuleId {
        CONCAT_RULE_ID.clone()
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Python, Language::TypeScript, Language::JavaScript]
    }

    fn check(&self, ctx: &FileContext, config: &serde_json::Value) -> Vec<Violation> {
        let Some(tree) = ctx.parsed.and_then(|p| p.as_tree_sitter()) else {
            return Vec::new();
        };
        let cfg: StringConcatConfig = serde_json::from_value(config.clone()).unwrap_or_default();
        if !cfg.enabled {
            return Vec::new();
        }
        let source = ctx.text.as_bytes();

        let mut loops = Vec::new();
        collect_loops(tree.root_node(), &mut loops);

        let mut violations = Vec::new();
        for loop_node in loops {
            let Some(body) = loop_body(loop_node) else { continue };
            let preinit = preloop_empty_string_names(ctx.text, loop_node.start_position().row);

            let mut hits: Vec<(Node, String)> = Vec::new();
            walk_without_nested_loops(body, &mut |n| {
                let target = match ctx.language {
                    Language::Python => python_concat_target(n, source),
                    _ => script_concat_target(n, source),
                };
                if let Some(name) = target {
                    hits.push((n, name));
                }
            });

            let matched: Vec<&(Node, String)> = hits
                .iter()
                .filter(|(_, name)| {
                    preinit.contains(name) || cfg.hint_substrings.iter().any(|h| name.to_lowercase().contains(h))
                })
                .collect();
            if matched.is_empty() {
                continue;
            }

            let to_report: Vec<&&(Node, String)> = if cfg.report_each_concat {
                matched.iter().collect()
            } else {
                matched.iter().take(1).collect()
            };
            for (node, _) in to_report {
                violations.push(build_violation(
                    &self.id(),
                    ctx.canonical_path,
                    node.start_position().row as u32 + 1,
                    1,
                    "string concatenation inside a loop is quadratic; build a list and join once",
                    Some("\"\".join(...) or an equivalent builder pattern".to_string()),
                    Severity::Error,
                ));
            }
        }
        violations
    }
}

// ---------------------------------------------------------------------
// performance.regex-in-loop (Python only)
// ---------------------------------------------------------------------

static REGEX_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("performance.regex-in-loop").expect("static rule id is valid"));

const RE_METHODS: &[&str] = &["match", "search", "sub", "findall", "split", "fullmatch"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegexCompileConfig {
    pub enabled: bool,
}

impl Default for RegexCompileConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

pub struct RegexCompileInLoopRule;

fn collect_re_compile_bindings(node: Node, source: &[u8], exclude: Node, out: &mut HashSet<String>) {
    if node.id() == exclude.id() {
        return;
    }
    if node.kind() == "assignment" {
        if let (Some(left), Some(right)) = (node.child_by_field_name("left"), node.child_by_field_name("right")) {
            if left.kind() == "identifier" && right.kind() == "call" {
                if let Some(func) = right.child_by_field_name("function") {
                    if func.utf8_text(source).ok() == Some("re.compile") {
                        if let Ok(name) = left.utf8_text(source) {
                            out.insert(name.to_string());
                        }
                    }
                }
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_re_compile_bindings(child, source, exclude, out);
    }
}

impl Rule for RegexCompileInLoopRule {
    fn id(&self) -> RuleId {
        REGEX_RULE_ID.clone()
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Python]
    }

    fn check(&self, ctx: &FileContext, config: &serde_json::Value) -> Vec<Violation> {
        let Some(tree) = ctx.parsed.and_then(|p| p.as_tree_sitter()) else {
            return Vec::new();
        };
        let cfg: RegexCompileConfig = serde_json::from_value(config.clone()).unwrap_or_default();
        if !cfg.enabled {
            return Vec::new();
        }
        let source = ctx.text.as_bytes();
        let root = tree.root_node();

        let mut loops = Vec::new();
        collect_loops(root, &mut loops);

        let mut violations = Vec::new();
        for loop_node in loops {
            let Some(body) = loop_body(loop_node) else { continue };

            let mut bindings = HashSet::new();
            collect_re_compile_bindings(root, source, body, &mut bindings);

            let mut calls = Vec::new();
            walk_without_nested_loops(body, &mut |n| {
                if n.kind() == "call" {
                    calls.push(n);
                }
            });

            for call in calls {
                let Some(func) = call.child_by_field_name("function") else { continue };
                if func.kind() != "attribute" {
                    continue;
                }
                let Some(obj) = func.child_by_field_name("object") else { continue };
                let Some(attr) = func.child_by_field_name("attribute") else { continue };
                let Ok(method) = attr.utf8_text(source) else { continue };
                if !RE_METHODS.contains(&method) {
                    continue;
                }
                let Ok(receiver) = obj.utf8_text(source) else { continue };
                if bindings.contains(receiver) {
                    continue;
                }
                violations.push(build_violation(
                    &self.id(),
                    ctx.canonical_path,
                    call.start_position().row as u32 + 1,
                    1,
                    format!("'re.{method}' recompiles its pattern on every loop iteration"),
                    Some("hoist re.compile(...) outside the loop and reuse the compiled pattern".to_string()),
                    Severity::Error,
                ));
            }
        }
        violations
    }
}
