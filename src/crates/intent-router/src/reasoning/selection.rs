//! Self-consistency winner selection
//!
//! The winner is the lower-middle sample by content length. Length is not a
//! quality signal; the rule is kept for behavioral parity and is the place
//! to plug in similarity voting later.

use crate::reasoning::ReasoningSample;

const SUMMARY_CHARS: usize = 100;

/// Position of the winning sample within `samples`
///
/// `samples` must be in sample-index order. Ties in length keep that order.
pub fn select_lower_middle(samples: &[ReasoningSample]) -> Option<usize> {
    if samples.is_empty() {
        return None;
    }

    let mut by_length: Vec<usize> = (0..samples.len()).collect();
    by_length.sort_by_key(|&pos| samples[pos].content.chars().count());

    by_length.get((samples.len() - 1) / 2).copied()
}

/// First non-empty line, cut to 100 characters
pub fn summarize(content: &str) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");

    if line.chars().count() > SUMMARY_CHARS {
        let cut: String = line.chars().take(SUMMARY_CHARS).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}
