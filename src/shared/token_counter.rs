//! Prompt cost estimation and the pre-flight budget guard.
//!
//! Character-based approximation (~4 characters per token), provider-agnostic.

use crate::domain::error::{AppError, Result};

/// Rule of thumb: ~4 characters = 1 token
pub const CHARS_PER_TOKEN: usize = 4;

/// Flat allowance for instruction and schema scaffolding sent with every prompt
pub const PROMPT_OVERHEAD_TOKENS: usize = 500;

/// Assumed rendered width of one quoted cell plus separator, used for row suggestions
pub const ASSUMED_CHARS_PER_FIELD: usize = 24;

pub struct TokenCounter;

impl TokenCounter {
    /// Estimate token count for text
    pub fn estimate_tokens(text: &str) -> usize {
        Self::estimate_char_tokens(text.len())
    }

    fn estimate_char_tokens(len: usize) -> usize {
        len.div_ceil(CHARS_PER_TOKEN)
    }

    /// Estimated cost of a prompt payload including the fixed overhead
    pub fn estimate_prompt_cost(payload: &str) -> usize {
        Self::estimate_tokens(payload) + PROMPT_OVERHEAD_TOKENS
    }

    /// Rows of `column_count` columns that fit under `ceiling`
    pub fn rows_within_budget(ceiling: usize, column_count: usize) -> usize {
        let available_chars = ceiling.saturating_sub(PROMPT_OVERHEAD_TOKENS) * CHARS_PER_TOKEN;
        let row_chars = column_count.max(1) * ASSUMED_CHARS_PER_FIELD;
        available_chars / row_chars
    }

    /// Returns the estimated cost, or `BudgetExceeded` with a smaller row
    /// suggestion when it is above `ceiling`.
    pub fn check_budget(
        payload: &str,
        ceiling: usize,
        column_count: usize,
        sampled_rows: usize,
    ) -> Result<usize> {
        let estimated = Self::estimate_prompt_cost(payload);
        if estimated <= ceiling {
            return Ok(estimated);
        }

        let suggested_rows = Self::rows_within_budget(ceiling, column_count)
            .min(sampled_rows.saturating_sub(1))
            .max(1);

        Err(AppError::BudgetExceeded {
            estimated,
            ceiling,
            suggested_rows,
        })
    }
}
