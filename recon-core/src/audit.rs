//! Structured audit logging for the engine's own security-relevant
//! decisions: a suppressed finding and a degraded store backend are
//! themselves worth a durable trail for later review, separate from the
//! findings a run emits.
//!
//! Scaled down to the two event kinds this engine needs: fields are
//! attached to the `tracing` event directly (`actor`, `doc_id`,
//! `destination_domain`, ...) rather than interpolated into the message, so
//! they remain queryable in structured log output.

use crate::types::IntentAnalysis;

/// Record that a draft finding was suppressed by the intent classifier.
pub fn log_suppressed_finding(actor: &str, exfil_event: &str, doc_id: Option<&str>, analysis: &IntentAnalysis) {
    tracing::info!(
        audit_event = "finding_suppressed",
        actor,
        exfil_event,
        doc_id,
        destination_domain = analysis.destination_domain.as_deref(),
        confidence = analysis.confidence,
        reasons = ?analysis.reasons,
        "suppressed finding as legitimate workflow"
    );
}

/// Record that the `ReconStore` backend failed and the run degraded to the
/// in-memory fallback for the remainder of the process lifetime.
pub fn log_store_degraded(backend: &str, error: &str) {
    tracing::warn!(
        audit_event = "store_degraded",
        backend,
        error,
        "recon store backend unavailable, degrading to in-memory"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Intent;

    #[test]
    fn log_suppressed_finding_does_not_panic_without_subscriber() {
        let analysis = IntentAnalysis {
            intent: Intent::Legitimate,
            confidence: 0.1,
            reasons: vec!["Destination domain example.com is trusted".to_string()],
            should_suppress: true,
            destination_domain: Some("example.com".to_string()),
        };
        log_suppressed_finding("alice@example.com", "change_user_access", Some("D1"), &analysis);
    }

    #[test]
    fn log_store_degraded_does_not_panic_without_subscriber() {
        log_store_degraded("redis", "connection refused");
    }
}
