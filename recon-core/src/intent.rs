//! IntentClassifier: per-actor baselines, domain-reputation cache, and
//! off-hours policy, combined into a confidence score that labels an egress
//! event malicious / suspicious / legitimate and may suppress it outright.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};
use parking_lot::RwLock;

use crate::clock::Clock;
use crate::types::{Intent, IntentAnalysis, UserBaseline};

const MALICIOUS_THRESHOLD: f64 = 0.7;
const SUSPICIOUS_THRESHOLD: f64 = 0.4;
const FREQUENT_DOWNLOADER_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DomainReputation {
    Trusted,
    Partner,
    Unknown,
}

/// Classifies the intent behind an egress event given the classifier's
/// accumulated per-actor state. `classify` is a pure function of its
/// arguments and the current baseline/reputation-cache contents; the
/// baseline update it performs as a side effect only affects *future* calls.
pub struct IntentClassifier {
    trusted_domains: HashSet<String>,
    partner_domains: HashSet<String>,
    clock: Arc<dyn Clock>,
    baselines: RwLock<HashMap<String, UserBaseline>>,
    reputation_cache: RwLock<HashMap<String, DomainReputation>>,
}

impl IntentClassifier {
    #[must_use]
    pub fn new(trusted_domains: Vec<String>, partner_domains: Vec<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            trusted_domains: trusted_domains.into_iter().map(|d| d.to_lowercase()).collect(),
            partner_domains: partner_domains.into_iter().map(|d| d.to_lowercase()).collect(),
            clock,
            baselines: RwLock::new(HashMap::new()),
            reputation_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Classify one egress event. Reads the actor's baseline as it stood
    /// before this call, then updates it with this event's signal.
    #[allow(clippy::too_many_arguments)]
    pub fn classify(
        &self,
        actor: &str,
        exfil_event: &str,
        doc_owner: Option<&str>,
        timestamp: DateTime<Utc>,
        new_value: Option<&str>,
    ) -> IntentAnalysis {
        let mut reasons = Vec::new();
        let mut confidence: f64 = 0.5;
        let mut should_suppress = false;

        let destination_domain = Self::extract_destination_domain(new_value);

        if let Some(domain) = &destination_domain {
            match self.domain_reputation(domain) {
                DomainReputation::Trusted => {
                    reasons.push(format!("Destination domain {domain} is trusted"));
                    confidence -= 0.4;
                    should_suppress = true;
                }
                DomainReputation::Partner => {
                    reasons.push(format!("Destination domain {domain} is a known partner"));
                    confidence -= 0.2;
                }
                DomainReputation::Unknown => {
                    reasons.push(format!("Destination domain {domain} is unknown/untrusted"));
                    confidence += 0.3;
                }
            }
        }

        if let Some(owner) = doc_owner {
            if Self::normalize_email(owner) == Self::normalize_email(actor) {
                reasons.push("User is sharing their own file".to_string());
                confidence -= 0.1;
            } else {
                reasons.push("User is sharing someone else's file".to_string());
                confidence += 0.3;
            }
        }

        let baseline_snapshot = self.baselines.read().get(actor).cloned();
        if let Some(baseline) = &baseline_snapshot {
            if let Some(domain) = &destination_domain {
                if baseline.has_domain(domain) {
                    reasons.push(format!("User has historically shared with {domain}"));
                    confidence -= 0.2;
                } else {
                    reasons.push(format!("First-time share with {domain}"));
                    confidence += 0.2;
                }
            }
        }

        if Self::is_off_hours(timestamp) {
            reasons.push("Activity occurred during off-hours".to_string());
            confidence += 0.2;
        }

        if matches!(exfil_event, "download" | "export") {
            if let Some(baseline) = &baseline_snapshot {
                if baseline.typical_download_count > FREQUENT_DOWNLOADER_THRESHOLD {
                    reasons.push("User frequently downloads files (likely legitimate workflow)".to_string());
                    confidence -= 0.15;
                }
            }
        }

        let intent = if confidence >= MALICIOUS_THRESHOLD {
            Intent::Malicious
        } else if confidence >= SUSPICIOUS_THRESHOLD {
            Intent::Suspicious
        } else {
            Intent::Legitimate
        };

        self.update_baseline(actor, exfil_event, destination_domain.as_deref());

        IntentAnalysis {
            intent,
            confidence: (confidence * 100.0).round() / 100.0,
            reasons,
            should_suppress,
            destination_domain,
        }
    }

    /// Extract an email destination domain from `new_value`. Visibility is
    /// not consulted: a public-on-the-web change with no `@` in `new_value`
    /// yields no destination domain.
    #[must_use]
    pub fn extract_destination_domain(new_value: Option<&str>) -> Option<String> {
        let value = new_value?;
        value.contains('@').then(|| value.rsplit('@').next().unwrap_or("").trim().to_string())
    }

    fn domain_reputation(&self, domain: &str) -> DomainReputation {
        let key = domain.to_lowercase();
        if let Some(rep) = self.reputation_cache.read().get(&key) {
            return *rep;
        }
        let rep = if self.trusted_domains.contains(&key) {
            DomainReputation::Trusted
        } else if self.partner_domains.contains(&key) {
            DomainReputation::Partner
        } else {
            DomainReputation::Unknown
        };
        self.reputation_cache.write().insert(key, rep);
        rep
    }

    fn normalize_email(email: &str) -> String {
        email.to_lowercase().trim().to_string()
    }

    fn is_off_hours(timestamp: DateTime<Utc>) -> bool {
        let weekday = timestamp.weekday().num_days_from_monday();
        if weekday >= 5 {
            return true;
        }
        let hour = timestamp.hour();
        hour < 6 || hour > 20
    }

    fn update_baseline(&self, actor: &str, exfil_event: &str, destination_domain: Option<&str>) {
        let now = self.clock.now();
        let mut guard = self.baselines.write();
        let baseline = guard
            .entry(actor.to_string())
            .or_insert_with(|| UserBaseline::new(actor.to_string(), now));

        if let Some(domain) = destination_domain {
            if !baseline.has_domain(domain) {
                baseline.typical_share_domains.push(domain.to_string());
            }
            baseline.typical_share_count += 1;
        }
        if matches!(exfil_event, "download" | "export") {
            baseline.typical_download_count += 1;
        }
        baseline.last_updated = now;
    }

    /// Seed baselines from a batch of historical egress events, run once
    /// before correlation.
    pub fn build_baselines_from_history(&self, events: &[crate::types::EgressEvent]) {
        for event in events {
            let destination_domain = Self::extract_destination_domain(event.new_value.as_deref());
            self.update_baseline(&event.actor, &event.event_name, destination_domain.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn ts(iso: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(iso).unwrap().with_timezone(&Utc)
    }

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(
            vec!["example-partner.com".into()],
            vec!["other-partner.com".into()],
            Arc::new(FixedClock(ts("2024-01-10T10:00:00Z"))),
        )
    }

    #[test]
    fn trusted_domain_suppresses_and_is_legitimate() {
        let classifier = IntentClassifier::new(
            vec!["example-partner.com".into()],
            vec![],
            Arc::new(FixedClock(ts("2024-01-10T10:00:00Z"))),
        );
        let analysis = classifier.classify(
            "alice@example.com",
            "change_user_access",
            None,
            ts("2024-01-10T10:01:00Z"),
            Some("bob@example-partner.com"),
        );
        assert!(analysis.should_suppress);
        assert_eq!(analysis.intent, Intent::Legitimate);
        assert_eq!(analysis.destination_domain.as_deref(), Some("example-partner.com"));
    }

    #[test]
    fn visibility_only_change_has_no_destination_domain() {
        let domain = IntentClassifier::extract_destination_domain(None);
        assert!(domain.is_none());
    }

    #[test]
    fn new_value_without_at_sign_has_no_destination_domain() {
        let domain = IntentClassifier::extract_destination_domain(Some("public_on_the_web"));
        assert!(domain.is_none());
    }

    #[test]
    fn unknown_destination_and_others_file_raises_confidence() {
        let classifier = classifier();
        let analysis = classifier.classify(
            "alice@example.com",
            "change_user_access",
            Some("carol@example.com"),
            ts("2024-01-10T12:00:00Z"),
            Some("mallory@shady.example"),
        );
        assert!(analysis.confidence > 0.5);
        assert!(matches!(analysis.intent, Intent::Suspicious | Intent::Malicious));
    }

    #[test]
    fn off_hours_weekend_is_flagged() {
        // 2024-01-13 is a Saturday.
        assert!(IntentClassifier::is_off_hours(ts("2024-01-13T12:00:00Z")));
        assert!(!IntentClassifier::is_off_hours(ts("2024-01-10T12:00:00Z")));
        assert!(IntentClassifier::is_off_hours(ts("2024-01-10T02:00:00Z")));
    }

    #[test]
    fn second_share_to_same_domain_is_familiar() {
        let classifier = classifier();
        let first = classifier.classify(
            "alice@example.com",
            "change_user_access",
            None,
            ts("2024-01-10T12:00:00Z"),
            Some("x@other-partner.com"),
        );
        let second = classifier.classify(
            "alice@example.com",
            "change_user_access",
            None,
            ts("2024-01-11T12:00:00Z"),
            Some("y@other-partner.com"),
        );
        assert!(first.reasons.iter().any(|r| r.contains("First-time share")));
        assert!(second.reasons.iter().any(|r| r.contains("historically shared")));
    }
}
