//! Default system prompt for the agent loop

use serde_json::json;

use crate::agent::directive::format_directive;
use crate::tools::ToolDescriptor;

/// Build the system prompt that teaches the model the directive format
pub fn default_system_prompt(tools: &[ToolDescriptor]) -> String {
    let mut prompt = String::from(
        r#"You are an autonomous agent working toward a goal with tools.
Work in a loop: THINK about the next step, ACT by requesting tools, then read
the tool results that come back and continue.

## Calling tools
Request a tool with a fenced block tagged `tool` containing one JSON object:

"#,
    );
    prompt.push_str(&format_directive(
        "tool_id",
        &json!({ "argument": "value" }),
    ));
    prompt.push_str(
        r#"

You may put several blocks in one response; they run in order. Every result
is returned to you in the next message.
"#,
    );

    if !tools.is_empty() {
        prompt.push_str("\n## Available tools\n");
        for tool in tools {
            prompt.push_str(&format!(
                "\n### {} (`{}`)\n{}\nExample:\n{}\n",
                tool.display_name,
                tool.id,
                tool.description,
                format_directive(&tool.id, &tool.example_inputs)
            ));
        }
    }

    prompt.push_str(
        r#"
## Rules
- Read the latest tool result before choosing the next action.
- If a tool fails, fix the inputs or try another approach.
- When the goal is complete, answer WITHOUT any tool block. That answer is final.
"#,
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::directive::parse_directives;

    #[test]
    fn lists_tools_with_parseable_examples() {
        let tools = vec![ToolDescriptor {
            id: "write_file".to_string(),
            display_name: "Write File".to_string(),
            description: "Write a file".to_string(),
            example_inputs: json!({"path": "a.txt", "content": "hi"}),
        }];
        let prompt = default_system_prompt(&tools);
        assert!(prompt.contains("### Write File (`write_file`)"));

        let parsed = parse_directives(&prompt);
        assert!(parsed.errors.is_empty());
        let ids: Vec<_> = parsed.directives.iter().map(|d| d.tool_id.as_str()).collect();
        assert_eq!(ids, vec!["tool_id", "write_file"]);
    }

    #[test]
    fn no_tools_section_when_empty() {
        assert!(!default_system_prompt(&[]).contains("## Available tools"));
    }
}
