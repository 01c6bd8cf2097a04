use crate::models::ChatTurn;

/// Forwarded chat history above this size is logged, not truncated.
pub const HISTORY_SOFT_CAP_TOKENS: usize = 8_000;

pub fn approx_tokens(s: &str) -> usize {
    // heuristic ~4 chars/token
    (s.chars().count() + 3) / 4
}

pub fn transcript_tokens(turns: &[ChatTurn]) -> usize {
    turns.iter().map(|t| approx_tokens(&t.text)).sum()
}

pub fn exceeds_soft_cap(turns: &[ChatTurn]) -> bool {
    transcript_tokens(turns) > HISTORY_SOFT_CAP_TOKENS
}
