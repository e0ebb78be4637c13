//! Starter questions offered while a conversation is empty.

use serde::Serialize;

/// Labels as displayed. The text after the first space is what gets asked.
const SAMPLE_LABELS: &[&str] = &[
    "🚀 Which events have the most founders and VCs?",
    "🌐 Where can I meet people from Arbitrum?",
    "💼 Which events feature companies that are hiring?",
    "🍻 Where can I grab a beer and network?",
];

/// A starter question with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleQuestion {
    /// Label shown to the user (with emoji prefix).
    pub label: &'static str,
    /// Question submitted to the endpoint (prefix stripped).
    pub question: &'static str,
}

impl SampleQuestion {
    fn from_label(label: &'static str) -> Self {
        let question = label.split_once(' ').map_or(label, |(_, rest)| rest);
        Self { label, question }
    }
}

/// All starter questions in display order.
pub fn samples() -> impl Iterator<Item = SampleQuestion> {
    SAMPLE_LABELS.iter().copied().map(SampleQuestion::from_label)
}

/// Starter question by 1-based position.
pub fn sample(number: usize) -> Option<SampleQuestion> {
    number
        .checked_sub(1)
        .and_then(|idx| SAMPLE_LABELS.get(idx))
        .copied()
        .map(SampleQuestion::from_label)
}
