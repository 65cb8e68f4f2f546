//! Markdown parsing: extraction of the YAML frontmatter block and the prose
//! body (§4.2). No AST is built; rules over Markdown operate on the raw body
//! text and the parsed frontmatter map.

use serde_yaml::Value;

#[derive(Debug, Clone, Default)]
pub struct MarkdownDoc {
    /// Parsed YAML frontmatter, if the file opens with a `---` fenced block.
    pub frontmatter: Option<Value>,
    /// The prose body, with the frontmatter fence stripped.
    pub body: String,
    /// 1-based line number the body starts at, for translating body-relative
    /// positions back to file positions.
    pub body_start_line: u32,
}

const FENCE: &str = "---";

pub fn parse(content: &str) -> MarkdownDoc {
    let mut lines = content.lines();
    let Some(first) = lines.next() else {
        return MarkdownDoc {
            frontmatter: None,
            body: String::new(),
            body_start_line: 1,
        };
    };

    if first.trim_end() != FENCE {
        return MarkdownDoc {
            frontmatter: None,
            body: content.to_string(),
            body_start_line: 1,
        };
    }

    let mut fm_lines = Vec::new();
    let mut consumed = 1usize;
    let mut closed = false;
    for line in lines.by_ref() {
        consumed += 1;
        if line.trim_end() == FENCE {
            closed = true;
            break;
        }
        fm_lines.push(line);
    }

    if !closed {
        // No closing fence: treat the whole file as body, per "parse failure is
        // a value" — we degrade rather than erroring, since Markdown has no
        // parse-error sentinel in this core.
        return MarkdownDoc {
            frontmatter: None,
            body: content.to_string(),
            body_start_line: 1,
        };
    }

    let frontmatter = serde_yaml::from_str(&fm_lines.join("\n")).ok();
    let body: String = lines.collect::<Vec<_>>().join("\n");

    MarkdownDoc {
        frontmatter,
        body,
        body_start_line: consumed as u32 + 1,
    }
}
