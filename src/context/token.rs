//! Token estimation
//!
//! The budgeting algorithm only sees the [`TokenEstimator`] trait, so a real
//! tokenizer can replace the character heuristic without touching it.

use crate::core::{Message, Role};

/// Per-message overhead for role name and delimiters
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Default characters per token
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 4.0;

/// Estimates token counts for text and messages
pub trait TokenEstimator: Send + Sync {
    /// Estimate tokens for raw text
    fn estimate(&self, text: &str) -> usize;

    /// Estimate tokens for one role-tagged message
    fn estimate_message(&self, _role: Role, content: &str) -> usize {
        MESSAGE_OVERHEAD_TOKENS + self.estimate(content)
    }

    /// Estimate tokens for a message sequence
    fn estimate_messages(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| self.estimate_message(m.role, &m.content))
            .sum()
    }
}

/// Fixed character-to-token ratio heuristic
#[derive(Debug, Clone, Copy)]
pub struct CharRatioEstimator {
    chars_per_token: f64,
}

impl CharRatioEstimator {
    pub fn new(chars_per_token: f64) -> Self {
        let chars_per_token = if chars_per_token > 0.0 {
            chars_per_token
        } else {
            DEFAULT_CHARS_PER_TOKEN
        };
        Self { chars_per_token }
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        (text.chars().count() as f64 / self.chars_per_token).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(CharRatioEstimator::default().estimate(""), 0);
    }

    #[test]
    fn rounds_up() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.estimate("test"), 1);
        assert_eq!(est.estimate("hello"), 2);
        assert_eq!(est.estimate(&"a".repeat(100)), 25);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.estimate("ééééé"), 2);
    }

    #[test]
    fn message_includes_overhead() {
        let est = CharRatioEstimator::default();
        let msgs = vec![Message::user("test"), Message::assistant("hello")];
        assert_eq!(est.estimate_messages(&msgs), 5 + 6);
    }

    #[test]
    fn invalid_ratio_falls_back() {
        let est = CharRatioEstimator::new(0.0);
        assert_eq!(est.chars_per_token(), DEFAULT_CHARS_PER_TOKEN);
    }
}
