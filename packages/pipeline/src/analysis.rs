//! Synthetic stage outputs.
//!
//! Nothing here inspects the page. Scores and patterns come from a
//! [`Randomness`] source and the decoy evidence is a fixed fixture.

use fakesense_case_models::{AiAnalysis, DecoyResults, RiskLevel};

use crate::randomness::Randomness;

/// Patterns risk scoring may report, in the order they are drawn.
pub const SUSPICIOUS_PATTERNS: [&str; 3] = [
    "Frequent name changes detected",
    "Low engagement ratio",
    "Contains suspicious keywords",
];

/// Recommendation for high-risk pages.
pub const DECOY_RECOMMENDATION: &str = "Requires AI decoy interaction";

/// Recommendation for every other page.
pub const MONITOR_RECOMMENDATION: &str = "Monitor closely";

/// Output of the risk-scoring stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    /// Score in `0..=100`.
    pub score: u8,
    /// Band derived from `score`.
    pub level: RiskLevel,
    /// Payload attached to the case.
    pub analysis: AiAnalysis,
}

/// Draws a risk assessment.
///
/// Consumes three values from `randomness`, in order: the score
/// (`0..=100`), the number of reported patterns (`1..=3`), and the
/// confidence (`70..=99`).
pub fn assess_risk(randomness: &dyn Randomness) -> RiskAssessment {
    let score = u8::try_from(randomness.next_in(0, 100)).unwrap_or(100).min(100);
    let level = RiskLevel::from_score(score);

    let pattern_count = randomness.next_in(1, 3) as usize;
    let suspicious_patterns = SUSPICIOUS_PATTERNS
        .iter()
        .take(pattern_count)
        .map(ToString::to_string)
        .collect();

    let recommendation = match level {
        RiskLevel::High => DECOY_RECOMMENDATION,
        RiskLevel::Medium | RiskLevel::Low => MONITOR_RECOMMENDATION,
    };

    let confidence = u8::try_from(randomness.next_in(70, 99)).unwrap_or(99);

    RiskAssessment {
        score,
        level,
        analysis: AiAnalysis {
            suspicious_patterns,
            recommendation: recommendation.to_string(),
            confidence,
        },
    }
}

/// Evidence "collected" by the decoy conversation.
#[must_use]
pub fn decoy_results() -> DecoyResults {
    DecoyResults {
        account_numbers: vec!["123-456-7890".to_string(), "098-765-4321".to_string()],
        suspicious_messages: vec![
            "Transfer the money to account 123-456-7890".to_string(),
            "Send me your OTP code".to_string(),
        ],
        evidence_screenshots: vec![
            "decoy_chat_1.png".to_string(),
            "decoy_chat_2.png".to_string(),
        ],
    }
}
