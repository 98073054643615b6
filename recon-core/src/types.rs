//! Domain data model: the records that flow through ingest, scoring,
//! correlation, and severity finalization.
//!
//! `ReconEvent` and `EgressEvent` are immutable once constructed, except for
//! `EgressEvent::is_revert`, which the revert detector sets exactly once
//! before correlation reads it (see [`crate::revert`]).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An assistant-interaction ("reconnaissance") observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconEvent {
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub app: String,
    pub action: String,
    pub event_id: String,
}

/// A platform action that could move document content outside its trust
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgressEvent {
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub event_name: String,
    pub doc_id: Option<String>,
    pub doc_title: Option<String>,
    pub visibility: Option<String>,
    pub old_visibility: Option<String>,
    pub new_value: Option<String>,
    pub old_value: Option<String>,
    pub owner: Option<String>,
    pub destination_folder_id: Option<String>,
    pub event_id: String,
    pub ip_address: Option<String>,
    /// Set exactly once by [`crate::revert::RevertDetector`] before correlation.
    #[serde(default)]
    pub is_revert: bool,
}

/// Stored form of one recon observation, as kept by the [`crate::store`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconActivity {
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub app: String,
    pub action: String,
    pub base_score: f64,
    pub doc_id: Option<String>,
}

/// File sensitivity classification, cheapest-to-most-sensitive order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

/// Cached per-document record returned by [`crate::file_context`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub doc_id: String,
    pub title: String,
    pub owner: String,
    pub labels: Vec<String>,
    pub sensitivity: Sensitivity,
    pub last_accessed: DateTime<Utc>,
    pub shared_externally_before: bool,
}

/// Per-actor learned profile of typical sharing destinations and download
/// frequency, maintained by [`crate::intent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBaseline {
    pub actor: String,
    pub typical_share_domains: Vec<String>,
    pub typical_share_count: u32,
    pub typical_download_count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl UserBaseline {
    pub fn new(actor: String, now: DateTime<Utc>) -> Self {
        Self {
            actor,
            typical_share_domains: Vec::new(),
            typical_share_count: 0,
            typical_download_count: 0,
            first_seen: now,
            last_updated: now,
        }
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.typical_share_domains.iter().any(|d| d == domain)
    }
}

/// Severity bucket, ordered low→high for comparisons; sort rank is
/// high-first (see [`Severity::rank`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank: high=0, medium=1, low=2, matching the finding-ordering rule.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }

    /// Promote one step towards high; a no-op at `High`.
    #[must_use]
    pub fn promote(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium | Severity::High => Severity::High,
        }
    }

    /// Downgrade one step towards low; a no-op at `Low`.
    #[must_use]
    pub fn downgrade(self) -> Self {
        match self {
            Severity::High => Severity::Medium,
            Severity::Medium | Severity::Low => Severity::Low,
        }
    }
}

/// File-sensitivity enrichment embedded in a [`Finding`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContext {
    pub sensitivity: Sensitivity,
    pub labels: Vec<String>,
    pub owner: String,
    pub shared_externally_before: bool,
}

/// Intent-classification result embedded in a [`Finding`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub intent: Intent,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub should_suppress: bool,
    pub destination_domain: Option<String>,
}

/// Classified intent label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Malicious,
    Suspicious,
    Legitimate,
}

/// The emitted unit of detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub actor: String,
    pub exfil_event: String,
    pub exfil_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_title: Option<String>,
    pub recon_action: String,
    pub recon_time: String,
    pub delta_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub reason: String,
    pub event_ids: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recon_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_context: Option<FileContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_analysis: Option<IntentAnalysis>,
    pub reason_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_anomaly: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_rank_orders_high_first() {
        let mut v = vec![Severity::Low, Severity::High, Severity::Medium];
        v.sort_by_key(|s| s.rank());
        assert_eq!(v, vec![Severity::High, Severity::Medium, Severity::Low]);
    }

    #[test]
    fn severity_promote_caps_at_high() {
        assert_eq!(Severity::Low.promote(), Severity::Medium);
        assert_eq!(Severity::Medium.promote(), Severity::High);
        assert_eq!(Severity::High.promote(), Severity::High);
    }

    #[test]
    fn severity_downgrade_floors_at_low() {
        assert_eq!(Severity::High.downgrade(), Severity::Medium);
        assert_eq!(Severity::Medium.downgrade(), Severity::Low);
        assert_eq!(Severity::Low.downgrade(), Severity::Low);
    }
}
