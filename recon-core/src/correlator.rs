//! Correlator: the hub. Joins recon and egress events per actor inside a
//! sliding window, consults the scorer, enriches via file context,
//! classifies intent, and raises delayed-exfil findings when cumulative
//! recon crosses a threshold without a matched recent recon.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono_tz::Tz;

use crate::file_context::FileContextEnricher;
use crate::intent::IntentClassifier;
use crate::scorer::ReconScorer;
use crate::severity::SeverityEngine;
use crate::store::ReconStore;
use crate::types::{EgressEvent, Finding, ReconEvent, Severity};

const DELAYED_EXFIL_SCORE_THRESHOLD: f64 = 5.0;

/// Joins recon/egress streams per actor within `window_minutes` and emits
/// `Finding`s, or a delayed-exfil finding when an egress event has no
/// matched recon but the actor's cumulative recon score is elevated.
pub struct Correlator {
    store: Arc<dyn ReconStore>,
    scorer: ReconScorer,
    file_enricher: Option<Arc<FileContextEnricher>>,
    intent_classifier: Arc<IntentClassifier>,
    canary_doc_ids: HashSet<String>,
    window_minutes: i64,
    timezone: Tz,
}

impl Correlator {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ReconStore>,
        scorer: ReconScorer,
        file_enricher: Option<Arc<FileContextEnricher>>,
        intent_classifier: Arc<IntentClassifier>,
        canary_doc_ids: HashSet<String>,
        window_minutes: i64,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            scorer,
            file_enricher,
            intent_classifier,
            canary_doc_ids,
            window_minutes,
            timezone,
        }
    }

    /// Correlate a batch of recon/egress events (egress events must already
    /// have `is_revert` set by [`crate::revert::RevertDetector`] and
    /// baselines seeded by [`IntentClassifier::build_baselines_from_history`]).
    /// Findings are returned sorted by (severity rank, `exfil_time`).
    pub async fn correlate(&self, recon_events: &[ReconEvent], egress_events: &[EgressEvent]) -> Vec<Finding> {
        let mut recon_by_actor: HashMap<&str, Vec<&ReconEvent>> = HashMap::new();
        for recon in recon_events {
            recon_by_actor.entry(recon.actor.as_str()).or_default().push(recon);
        }

        let mut findings = Vec::new();

        for egress in egress_events {
            let activities = self.store.activities(&egress.actor).await;
            let recon_score = self.scorer.score(&activities, egress.timestamp);

            let mut matched = false;
            if let Some(recons) = recon_by_actor.get(egress.actor.as_str()) {
                for recon in recons {
                    let delta_minutes = (egress.timestamp - recon.timestamp).num_seconds() as f64 / 60.0;
                    if !(0.0..=self.window_minutes as f64).contains(&delta_minutes) {
                        continue;
                    }
                    matched = true;

                    if let Some(finding) = self.build_finding(egress, recon, delta_minutes, recon_score).await {
                        findings.push(finding);
                    }
                }
            }

            if !matched && recon_score > DELAYED_EXFIL_SCORE_THRESHOLD {
                findings.push(self.delayed_exfil_finding(egress, recon_score));
            }
        }

        findings.sort_by(|a, b| a.severity.rank().cmp(&b.severity.rank()).then(a.exfil_time.cmp(&b.exfil_time)));
        findings
    }

    async fn build_finding(
        &self,
        egress: &EgressEvent,
        recon: &ReconEvent,
        delta_minutes: f64,
        recon_score: f64,
    ) -> Option<Finding> {
        let mut outcome = SeverityEngine::compute(egress, delta_minutes, recon_score);

        let is_canary = egress.doc_id.as_ref().is_some_and(|d| self.canary_doc_ids.contains(d));
        if is_canary {
            outcome.severity = Severity::High;
            outcome.reasons.insert(0, "CANARY DOCUMENT ACCESS".to_string());
            outcome.reason_codes.push("canary_doc_access".to_string());
        }

        let mut event_ids = HashMap::new();
        event_ids.insert("recon".to_string(), recon.event_id.clone());
        event_ids.insert("exfil".to_string(), egress.event_id.clone());

        let reason = if is_canary {
            format!("CANARY DOCUMENT ACCESS - {}", outcome.reasons[1..].join("; "))
        } else {
            outcome.reason_string()
        };

        let mut finding = Finding {
            severity: outcome.severity,
            actor: egress.actor.clone(),
            exfil_event: egress.event_name.clone(),
            exfil_time: egress.timestamp.with_timezone(&self.timezone).to_rfc3339(),
            doc_id: egress.doc_id.clone(),
            doc_title: egress.doc_title.clone(),
            recon_action: recon.action.clone(),
            recon_time: recon.timestamp.with_timezone(&self.timezone).to_rfc3339(),
            delta_minutes: (delta_minutes * 100.0).round() / 100.0,
            visibility: egress.visibility.clone(),
            reason,
            event_ids,
            recon_score: Some(recon_score),
            file_context: None,
            intent_analysis: None,
            reason_codes: outcome.reason_codes,
            ip_address: egress.ip_address.clone(),
            geo_anomaly: None,
        };

        if let (Some(enricher), Some(doc_id)) = (&self.file_enricher, &egress.doc_id) {
            enricher.enrich_finding(&mut finding, doc_id).await;
        }

        let analysis = self.intent_classifier.classify(
            &egress.actor,
            &egress.event_name,
            egress.owner.as_deref(),
            egress.timestamp,
            egress.new_value.as_deref(),
        );

        if analysis.should_suppress {
            crate::audit::log_suppressed_finding(&egress.actor, &egress.event_name, egress.doc_id.as_deref(), &analysis);
            return None;
        }

        if analysis.intent == crate::types::Intent::Legitimate {
            finding.severity = finding.severity.downgrade();
        }
        finding.intent_analysis = Some(analysis);

        Some(finding)
    }

    fn delayed_exfil_finding(&self, egress: &EgressEvent, recon_score: f64) -> Finding {
        let mut event_ids = HashMap::new();
        event_ids.insert("recon".to_string(), "N/A".to_string());
        event_ids.insert("exfil".to_string(), egress.event_id.clone());

        Finding {
            severity: Severity::Medium,
            actor: egress.actor.clone(),
            exfil_event: egress.event_name.clone(),
            exfil_time: egress.timestamp.with_timezone(&self.timezone).to_rfc3339(),
            doc_id: egress.doc_id.clone(),
            doc_title: egress.doc_title.clone(),
            recon_action: "cumulative_recon".to_string(),
            recon_time: "N/A (multi-stage)".to_string(),
            delta_minutes: 0.0,
            visibility: egress.visibility.clone(),
            reason: format!("Delayed exfil after cumulative recon (score={recon_score})"),
            event_ids,
            recon_score: Some(recon_score),
            file_context: None,
            intent_analysis: None,
            reason_codes: vec![],
            ip_address: egress.ip_address.clone(),
            geo_anomaly: None,
        }
    }
}
