//! Python parsing via tree-sitter (§4.2: "a concrete syntax tree with
//! line/column spans").

use tree_sitter::{Parser, Tree};

pub fn parse(content: &str) -> Result<Tree, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| format!("failed to load python grammar: {e}"))?;
    parser
        .parse(content, None)
        .ok_or_else(|| "tree-sitter failed to produce a python parse tree".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_function() {
        let tree = parse("def f():\n    pass\n").unwrap();
        assert_eq!(tree.root_node().kind(), "module");
    }

    #[test]
    fn parses_empty_file() {
        let tree = parse("").unwrap();
        assert_eq!(tree.root_node().child_count(), 0);
    }
}
