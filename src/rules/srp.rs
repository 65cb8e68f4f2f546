//! Single-responsibility heuristic (§4.6, C8): per-class method/LOC/keyword
//! scoring. Python only — the keyword and `@dataclass`/abstract-class
//! conventions this heuristic leans on are Python idioms (see DESIGN.md).

use super::{FileContext, Rule};
use crate::types::{Language, RuleId, Severity};
use crate::violation::build_violation;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tree_sitter::Node;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SrpConfig {
    pub max_methods: u32,
    pub max_loc: u32,
    pub suspicious_keywords: Vec<String>,
}

impl Default for SrpConfig {
    fn default() -> Self {
        Self {
            max_methods: 7,
            max_loc: 200,
            suspicious_keywords: ["Manager", "Handler", "Processor", "Utility", "Helper"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

static RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("srp.too-many-responsibilities").expect("static rule id is valid"));

pub struct SrpHeuristicRule;

struct Method {
    decorators: Vec<String>,
}

impl Rule for SrpHeuristicRule {
    fn id(&self) -> RuleId {
        RULE_ID.clone()
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Python]
    }

    fn check(&self, ctx: &FileContext, config: &serde_json::Value) -> Vec<crate::violation::Violation> {
        let Some(tree) = ctx.parsed.and_then(|p| p.as_tree_sitter()) else {
            return Vec::new();
        };
        let cfg: SrpConfig = serde_json::from_value(config.clone()).unwrap_or_default();

        let mut classes = Vec::new();
        collect_classes(tree.root_node(), &mut classes);

        let lines: Vec<&str> = ctx.text.lines().collect();
        let mut violations = Vec::new();
        for class in classes {
            let Some(name_node) = class.child_by_field_name("name") else {
                continue;
            };
            let class_name = &ctx.text[name_node.byte_range()];
            let Some(body) = class.child_by_field_name("body") else {
                continue;
            };
            let methods = collect_methods(body, ctx.text.as_bytes());
            if methods.is_empty() {
                continue;
            }
            if methods
                .iter()
                .all(|m| m.decorators.iter().any(|d| d == "abstractmethod"))
            {
                continue;
            }

            let method_count = methods
                .iter()
                .filter(|m| !m.decorators.iter().any(|d| d == "property"))
                .count() as u32;
            let loc = count_loc(&lines, class.start_position().row, class.end_position().row);
            let keyword_hit = cfg
                .suspicious_keywords
                .iter()
                .any(|kw| class_name.contains(kw.as_str()));

            let mut hits = 0u8;
            if method_count > cfg.max_methods {
                hits += 1;
            }
            if loc > cfg.max_loc {
                hits += 1;
            }
            if keyword_hit {
                hits += 1;
            }

            if hits == 0 {
                continue;
            }
            let label = match hits {
                1 => "1 heuristic",
                2 => "2 heuristics",
                _ => "3 heuristics",
            };
            violations.push(build_violation(
                &self.id(),
                ctx.canonical_path,
                name_node.start_position().row as u32 + 1,
                1,
                format!(
                    "class '{class_name}' trips {label} for single-responsibility (methods={method_count}, loc={loc}, keyword_hit={keyword_hit})"
                ),
                Some("split this class along its distinct responsibilities".to_string()),
                Severity::Error,
            ));
        }
        violations
    }
}

fn collect_classes<'a>(node: Node<'a>, out: &mut Vec<Node<'a>>) {
    if node.kind() == "class_definition" {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_classes(child, out);
    }
}

fn collect_methods(body: Node, source: &[u8]) -> Vec<Method> {
    let mut out = Vec::new();
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "function_definition" => out.push(Method { decorators: Vec::new() }),
            "decorated_definition" => {
                let mut decorators = Vec::new();
                let mut is_method = false;
                let mut inner = child.walk();
                for grandchild in child.children(&mut inner) {
                    match grandchild.kind() {
                        "decorator" => {
                            if let Some(name) = decorator_name(grandchild, source) {
                                decorators.push(name);
                            }
                        }
                        "function_definition" => is_method = true,
                        _ => {}
                    }
                }
                if is_method {
                    out.push(Method { decorators });
                }
            }
            _ => {}
        }
    }
    out
}

fn decorator_name(decorator: Node, source: &[u8]) -> Option<String> {
    let text = decorator.utf8_text(source).ok()?;
    Some(
        text.trim_start_matches('@')
            .split('(')
            .next()
            .unwrap_or("")
            .trim()
            .to_string(),
    )
}

fn count_loc(lines: &[&str], start_row: usize, end_row: usize) -> u32 {
    lines
        .iter()
        .skip(start_row)
        .take(end_row.saturating_sub(start_row) + 1)
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ContentHash;
    use crate::parsing::{python, ParsedTree};
    use std::path::Path;

    fn check(src: &str, cfg: serde_json::Value) -> Vec<crate::violation::Violation> {
        let tree = python::parse(src).unwrap();
        let parsed = ParsedTree::Python(tree);
        let hash = ContentHash::of_bytes(src.as_bytes());
        let ctx = FileContext {
            canonical_path: Path::new("a.py"),
            relative_path: Path::new("a.py"),
            language: Language::Python,
            text: src,
            content_hash: &hash,
            parsed: Some(&parsed),
        };
        SrpHeuristicRule.check(&ctx, &cfg)
    }

    #[test]
    fn small_class_has_no_violation() {
        let src = "class Widget:\n    def a(self):\n        pass\n";
        assert!(check(src, serde_json::json!({})).is_empty());
    }

    #[test]
    fn keyword_hit_alone_triggers_one_heuristic() {
        let src = "class OrderManager:\n    def a(self):\n        pass\n";
        let v = check(src, serde_json::json!({}));
        assert_eq!(v.len(), 1);
        assert!(v[0].message.contains("1 heuristic"));
    }

    #[test]
    fn too_many_methods_triggers_violation() {
        let mut src = String::from("class Widget:\n");
        for i in 0..10 {
            src.push_str(&format!("    def m{i}(self):\n        pass\n"));
        }
        let v = check(&src, serde_json::json!({"max_methods": 7}));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn abstract_only_class_is_skipped() {
        let src = "class Shape:\n    @abstractmethod\n    def area(self):\n        ...\n";
        assert!(check(src, serde_json::json!({"max_methods": 0})).is_empty());
    }

    #[test]
    fn property_decorated_methods_do_not_count() {
        let src = "class Widget:\n    @property\n    def a(self):\n        pass\n";
        let v = check(src, serde_json::json!({"max_methods": 0}));
        assert!(v.is_empty());
    }
}
