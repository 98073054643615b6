//! Stateful recon scoring with exponential decay.
//!
//! Pure component: given a set of [`ReconActivity`] records and a point in
//! time, computes a cumulative score under half-life decay. The base-score
//! table is also used by [`crate::store`] at append time to stamp each
//! activity with its base score.

use chrono::{DateTime, Utc};

use crate::types::ReconActivity;

/// Default decay half-life, in hours.
pub const DEFAULT_HALF_LIFE_HOURS: f64 = 48.0;

/// High-risk cumulative-score threshold.
pub const SCORE_THRESHOLD_HIGH: f64 = 10.0;
/// Medium-risk cumulative-score threshold.
pub const SCORE_THRESHOLD_MEDIUM: f64 = 5.0;

/// Base score for a recon action, per the table in the scoring design.
#[must_use]
pub fn base_score_for_action(action: &str) -> f64 {
    match action {
        "catch_me_up" => 5.0,
        "analyze_documents" => 4.0,
        "ask_about_this_file" | "summarize_file" => 3.0,
        "summarize_long" | "ask_about_context" => 2.0,
        "summarize" => 1.5,
        _ => 1.0,
    }
}

/// Coarse risk bucket for a cumulative recon score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

/// Computes cumulative recon score under exponential decay.
#[derive(Debug, Clone, Copy)]
pub struct ReconScorer {
    half_life_hours: f64,
}

impl ReconScorer {
    #[must_use]
    pub fn new(half_life_hours: f64) -> Self {
        Self { half_life_hours }
    }

    /// `score = Σ base_i · 0.5^(elapsed_hours_i / half_life)`, rounded to 2
    /// decimals. Activities timestamped after `now` decay as if elapsed
    /// hours were zero.
    #[must_use]
    pub fn score(&self, activities: &[ReconActivity], now: DateTime<Utc>) -> f64 {
        let total: f64 = activities
            .iter()
            .map(|a| {
                let elapsed_hours = (now - a.timestamp).num_milliseconds() as f64 / 3_600_000.0;
                let elapsed_hours = elapsed_hours.max(0.0);
                let decay = 0.5_f64.powf(elapsed_hours / self.half_life_hours);
                a.base_score * decay
            })
            .sum();
        (total * 100.0).round() / 100.0
    }

    /// Bucket a cumulative score into high/medium/low.
    #[must_use]
    pub fn risk_level(score: f64) -> RiskLevel {
        if score >= SCORE_THRESHOLD_HIGH {
            RiskLevel::High
        } else if score >= SCORE_THRESHOLD_MEDIUM {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl Default for ReconScorer {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_LIFE_HOURS)
    }
}
