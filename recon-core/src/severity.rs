//! SeverityEngine: a pure, total function from (egress event, delta,
//! cumulative recon score) to (severity, reason codes, reason string).
//!
//! Exposed as composable transformations over a `(Severity, reason_codes,
//! reasons)` triple rather than a nested if/else tree, per the documented
//! severity-ordering pipeline: canary > revert > base-severity >
//! intent-downgrade > high-recon-upgrade > file-sensitivity-upgrade. Canary,
//! intent-downgrade, and file-sensitivity-upgrade are applied by the
//! correlator/enricher; this module owns revert + base-severity +
//! recon-score amplification.

use crate::ingest::HIGH_RISK_VISIBILITY;
use crate::types::{EgressEvent, Severity};

const IMMEDIATE_WINDOW_MINUTES: f64 = 10.0;
const SUSPICIOUS_WINDOW_MINUTES: f64 = 30.0;
const HIGH_RECON_SCORE: f64 = 10.0;
const ELEVATED_RECON_SCORE: f64 = 5.0;

/// The outcome of a severity computation: the bucket, its ordered reason
/// codes, and the human-readable reasons in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityOutcome {
    pub severity: Severity,
    pub reason_codes: Vec<String>,
    pub reasons: Vec<String>,
}

impl SeverityOutcome {
    #[must_use]
    pub fn reason_string(&self) -> String {
        self.reasons.join("; ")
    }
}

struct EventFlags {
    external_share: bool,
    export_download: bool,
    ownership_transfer: bool,
    shortcut: bool,
    publish: bool,
}

impl EventFlags {
    fn classify(event: &EgressEvent) -> Self {
        let name = &event.event_name;
        let high_risk_visibility = event
            .visibility
            .as_deref()
            .is_some_and(|v| HIGH_RISK_VISIBILITY.contains(&v));

        Self {
            external_share: (name.contains("change_acl") || name.contains("change_visibility")) && high_risk_visibility,
            export_download: name.contains("download") || name.contains("export"),
            ownership_transfer: name.contains("transfer_ownership"),
            shortcut: name.contains("create_shortcut"),
            publish: name.contains("publish_to_web"),
        }
    }
}

/// Pure severity computation.
pub struct SeverityEngine;

impl SeverityEngine {
    /// Compute the base severity for `event` given `delta_minutes` (time
    /// since the matched recon) and `recon_score` (cumulative, decayed),
    /// then apply the recon-score amplification step. Does not know about
    /// canary overrides, intent downgrades, or file-sensitivity upgrades —
    /// those compose on top of this result.
    #[must_use]
    pub fn compute(event: &EgressEvent, delta_minutes: f64, recon_score: f64) -> SeverityOutcome {
        let mut reasons = Vec::new();
        let mut reason_codes = Vec::new();
        let flags = EventFlags::classify(event);

        let mut severity = if event.is_revert {
            reasons.push("External toggle with rapid revert (evasion pattern)".to_string());
            reason_codes.push("external_toggle_revert".to_string());
            Severity::High
        } else if delta_minutes <= IMMEDIATE_WINDOW_MINUTES {
            if flags.external_share || flags.ownership_transfer || flags.publish {
                reasons.push("External share/transfer within 10min of recon".to_string());
                reason_codes.push("external_share_immediate".to_string());
                Severity::High
            } else if flags.export_download {
                reasons.push("Export/download within 10min of recon".to_string());
                reason_codes.push("export_immediate".to_string());
                Severity::High
            } else if flags.shortcut {
                reasons.push("Shortcut creation within 10min of recon".to_string());
                reason_codes.push("shortcut_immediate".to_string());
                Severity::Medium
            } else {
                reasons.push("Activity within 10min".to_string());
                reason_codes.push("activity_immediate".to_string());
                Severity::Medium
            }
        } else if delta_minutes <= SUSPICIOUS_WINDOW_MINUTES {
            if flags.external_share || flags.export_download || flags.ownership_transfer {
                reasons.push("Suspicious activity within 30min".to_string());
                reason_codes.push("suspicious_30min".to_string());
                Severity::Medium
            } else {
                reasons.push("Activity correlation detected".to_string());
                reason_codes.push("activity_correlated".to_string());
                Severity::Low
            }
        } else {
            reasons.push("Activity correlation detected".to_string());
            reason_codes.push("activity_correlated".to_string());
            Severity::Low
        };

        if recon_score >= HIGH_RECON_SCORE {
            reasons.push(format!("High cumulative recon score ({recon_score})"));
            reason_codes.push("high_recon_score".to_string());
            severity = severity.promote();
        } else if recon_score >= ELEVATED_RECON_SCORE {
            reasons.push(format!("Elevated recon score ({recon_score})"));
            reason_codes.push("elevated_recon_score".to_string());
        }

        SeverityOutcome {
            severity,
            reason_codes,
            reasons,
        }
    }
}
