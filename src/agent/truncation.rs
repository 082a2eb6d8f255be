//! Size bounds for tool output entering history
//!
//! Long file reads keep their head and tail; any other long output keeps a
//! capped prefix. Either way a marker records how much was cut.

use crate::core::TruncationConfig;

/// How a long output is shortened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationStyle {
    HeadAndTail,
    Prefix,
}

impl TruncationStyle {
    /// File reads keep both ends; everything else reads like a log
    pub fn for_tool(tool_id: &str) -> Self {
        let id = tool_id.to_ascii_lowercase();
        if id.contains("read") || id.contains("cat") || id.contains("view") {
            TruncationStyle::HeadAndTail
        } else {
            TruncationStyle::Prefix
        }
    }
}

/// Applies the configured size limits
#[derive(Debug, Clone)]
pub struct TruncationPolicy {
    config: TruncationConfig,
}

impl TruncationPolicy {
    pub fn new(config: TruncationConfig) -> Self {
        Self { config }
    }

    /// Bound `text` produced by `tool_id`
    pub fn apply(&self, tool_id: &str, text: &str) -> String {
        let total = text.chars().count();
        if total <= self.config.max_result_chars {
            return text.to_string();
        }

        match TruncationStyle::for_tool(tool_id) {
            TruncationStyle::HeadAndTail => {
                if self.config.head_chars + self.config.tail_chars >= total {
                    return text.to_string();
                }
                let head_len = self.config.head_chars.min(total);
                let tail_len = self.config.tail_chars.min(total - head_len);
                let head: String = text.chars().take(head_len).collect();
                let tail: String = text.chars().skip(total - tail_len).collect();
                format!(
                    "{}\n\n[... {} characters truncated ...]\n\n{}",
                    head,
                    total - head_len - tail_len,
                    tail
                )
            }
            TruncationStyle::Prefix => {
                if self.config.log_prefix_chars >= total {
                    return text.to_string();
                }
                let keep = self.config.log_prefix_chars.min(total);
                let prefix: String = text.chars().take(keep).collect();
                format!(
                    "{}\n\n[... output truncated, {} of {} characters shown ...]",
                    prefix, keep, total
                )
            }
        }
    }
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self::new(TruncationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TruncationPolicy {
        TruncationPolicy::new(TruncationConfig {
            max_result_chars: 20,
            head_chars: 5,
            tail_chars: 5,
            log_prefix_chars: 8,
        })
    }

    #[test]
    fn short_output_is_untouched() {
        assert_eq!(policy().apply("read_file", "short"), "short");
    }

    #[test]
    fn file_reads_keep_head_and_tail() {
        let text = format!("HEAD!{}TAIL!", "m".repeat(30));
        let out = policy().apply("read_file", &text);
        assert!(out.starts_with("HEAD!"));
        assert!(out.ends_with("TAIL!"));
        assert!(out.contains("[... 30 characters truncated ...]"));
    }

    #[test]
    fn logs_keep_prefix() {
        let text = "0123456789".repeat(5);
        let out = policy().apply("run_code", &text);
        assert!(out.starts_with("01234567\n"));
        assert!(out.contains("8 of 50 characters shown"));
    }

    #[test]
    fn limits_covering_the_whole_text_add_no_marker() {
        let policy = TruncationPolicy::new(TruncationConfig {
            max_result_chars: 10,
            head_chars: 8,
            tail_chars: 8,
            log_prefix_chars: 30,
        });
        let text = "a".repeat(15);
        assert_eq!(policy.apply("read_file", &text), text);
        assert_eq!(policy.apply("run_code", &text), text);

        let long = "b".repeat(40);
        assert!(policy.apply("read_file", &long).contains("[... 24 characters truncated ...]"));
    }

    #[test]
    fn style_selection() {
        assert_eq!(TruncationStyle::for_tool("read_file"), TruncationStyle::HeadAndTail);
        assert_eq!(TruncationStyle::for_tool("execute_python"), TruncationStyle::Prefix);
    }
}
