//! Tool-call directives embedded in LLM output
//!
//! Wire format: a fenced block whose opening fence carries the `tool` tag,
//! holding one JSON object with a `tool` id and an optional `inputs` map:
//!
//! ````text
//! ```tool
//! {"tool": "write_file", "inputs": {"path": "notes.md", "content": "hi"}}
//! ```
//! ````
//!
//! Every block is parsed on its own, so one malformed block never hides the
//! others.

use serde_json::Value;
use thiserror::Error;

use crate::tools::ToolInputs;

const FENCE: &str = "```";
const TAG: &str = "tool";

/// A parsed tool invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDirective {
    pub tool_id: String,
    pub inputs: ToolInputs,
    /// Zero-based position among the tool blocks of the response
    pub block_index: usize,
}

/// Why a tool block was skipped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectiveError {
    #[error("tool block {block} is never closed")]
    Unterminated { block: usize },

    #[error("tool block {block} is not valid JSON: {message}")]
    InvalidJson { block: usize, message: String },

    #[error("tool block {block} is not a JSON object")]
    NotAnObject { block: usize },

    #[error("tool block {block} has no non-empty \"tool\" string")]
    MissingTool { block: usize },

    #[error("tool block {block} has \"inputs\" that is not an object")]
    InvalidInputs { block: usize },
}

/// All directives and skipped blocks found in one response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub directives: Vec<ToolDirective>,
    pub errors: Vec<DirectiveError>,
}

impl ParsedResponse {
    pub fn has_directives(&self) -> bool {
        !self.directives.is_empty()
    }
}

/// Parse every tool block in `text`, in order of appearance
pub fn parse_directives(text: &str) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();
    let mut lines = text.lines();
    let mut block = 0;

    while let Some(line) = lines.next() {
        if !is_tool_fence(line) {
            continue;
        }

        let mut body = String::new();
        let mut closed = false;
        for inner in lines.by_ref() {
            if inner.trim() == FENCE {
                closed = true;
                break;
            }
            body.push_str(inner);
            body.push('\n');
        }

        if closed {
            match parse_block(&body, block) {
                Ok(directive) => parsed.directives.push(directive),
                Err(e) => parsed.errors.push(e),
            }
        } else {
            parsed.errors.push(DirectiveError::Unterminated { block });
        }
        block += 1;
    }

    parsed
}

fn is_tool_fence(line: &str) -> bool {
    line.trim()
        .strip_prefix(FENCE)
        .map(|info| info.trim() == TAG)
        .unwrap_or(false)
}

fn parse_block(body: &str, block: usize) -> Result<ToolDirective, DirectiveError> {
    let value: Value = serde_json::from_str(body.trim()).map_err(|e| DirectiveError::InvalidJson {
        block,
        message: e.to_string(),
    })?;

    let mut object = match value {
        Value::Object(object) => object,
        _ => return Err(DirectiveError::NotAnObject { block }),
    };

    let tool_id = match object.remove("tool") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
        _ => return Err(DirectiveError::MissingTool { block }),
    };

    let inputs = match object.remove("inputs") {
        None | Some(Value::Null) => ToolInputs::new(),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(DirectiveError::InvalidInputs { block }),
    };

    Ok(ToolDirective {
        tool_id,
        inputs,
        block_index: block,
    })
}

/// Render a directive in wire format, as the model is expected to write it
pub fn format_directive(tool_id: &str, inputs: &Value) -> String {
    let body = serde_json::json!({ "tool": tool_id, "inputs": inputs });
    format!("{FENCE}{TAG}\n{body}\n{FENCE}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_multiple_blocks_in_order() {
        let text = r#"I'll write the file, then list the directory.

```tool
{"tool": "write_file", "inputs": {"path": "a.txt", "content": "A"}}
```

Some more prose.

```tool
{"tool": "list_directory"}
```
"#;
        let parsed = parse_directives(text);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.directives.len(), 2);
        assert_eq!(parsed.directives[0].tool_id, "write_file");
        assert_eq!(parsed.directives[0].inputs["path"], json!("a.txt"));
        assert_eq!(parsed.directives[1].tool_id, "list_directory");
        assert!(parsed.directives[1].inputs.is_empty());
        assert_eq!(parsed.directives[1].block_index, 1);
    }

    #[test]
    fn bad_block_does_not_hide_good_ones() {
        let text = "```tool\n{not json}\n```\n```tool\n{\"tool\": \"read_file\", \"inputs\": {\"path\": \"x\"}}\n```\n";
        let parsed = parse_directives(text);
        assert_eq!(parsed.directives.len(), 1);
        assert_eq!(parsed.directives[0].block_index, 1);
        assert!(matches!(
            parsed.errors[0],
            DirectiveError::InvalidJson { block: 0, .. }
        ));
    }

    #[test]
    fn typed_errors_for_malformed_objects() {
        let text = "```tool\n[1, 2]\n```\n```tool\n{\"inputs\": {}}\n```\n```tool\n{\"tool\": \"x\", \"inputs\": 5}\n```\n```tool\n{\"tool\": \"y\"";
        let parsed = parse_directives(text);
        assert!(parsed.directives.is_empty());
        assert_eq!(
            parsed.errors,
            vec![
                DirectiveError::NotAnObject { block: 0 },
                DirectiveError::MissingTool { block: 1 },
                DirectiveError::InvalidInputs { block: 2 },
                DirectiveError::Unterminated { block: 3 },
            ]
        );
    }

    #[test]
    fn ignores_other_code_blocks() {
        let text = "```rust\nfn main() {}\n```\n```json\n{\"tool\": \"nope\"}\n```\nDone, nothing left to do.";
        let parsed = parse_directives(text);
        assert!(!parsed.has_directives());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn format_directive_parses_back() {
        let text = format_directive("write_file", &json!({"path": "p"}));
        let parsed = parse_directives(&text);
        assert_eq!(parsed.directives[0].tool_id, "write_file");
    }
}
