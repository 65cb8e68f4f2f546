//! TypeScript/JavaScript parsing via tree-sitter (§4.2: "a tree-sitter-derived
//! tree with span information").

use crate::types::Language;
use tree_sitter::{Parser, Tree};

pub fn parse(language: Language, content: &str) -> Result<Tree, String> {
    let mut parser = Parser::new();
    let grammar = match language {
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        other => return Err(format!("script parser invoked for non-script language {other}")),
    };
    parser
        .set_language(&grammar)
        .map_err(|e| format!("failed to load {language} grammar: {e}"))?;
    parser
        .parse(content, None)
        .ok_or_else(|| format!("tree-sitter failed to produce a {language} parse tree"))
}
