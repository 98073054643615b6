//! Pipeline Driver: fetches raw events from the two `ActivitySource`
//! streams, feeds them through the components in dependency order, and
//! returns sorted findings. The sole place outside `recon-cli` that wires
//! every component together for a single detection run.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Duration;

use crate::clock::Clock;
use crate::config::Config;
use crate::correlator::Correlator;
use crate::error::{Error, Result};
use crate::file_context::FileContextEnricher;
use crate::ingest::{parse_egress_events, parse_recon_events};
use crate::intent::IntentClassifier;
use crate::revert::RevertDetector;
use crate::scorer::ReconScorer;
use crate::source::{ActivitySource, FileMetadataSource};
use crate::store::ReconStore;
use crate::types::Finding;

/// Run one detection pass: fetch, ingest, record, detect reverts, build
/// baselines, correlate, and return findings already sorted by
/// (severity, `exfil_time`).
pub async fn run_detection(
    config: &Config,
    clock: Arc<dyn Clock>,
    activity_source: Arc<dyn ActivitySource>,
    file_metadata_source: Arc<dyn FileMetadataSource>,
    store: Arc<dyn ReconStore>,
    lookback_hours: i64,
    window_minutes: i64,
) -> Result<Vec<Finding>> {
    let now = clock.now();
    let start_time = now - Duration::hours(lookback_hours);

    tracing::info!(lookback_hours, "fetching recon and egress activity");

    let (raw_recon, raw_egress) = tokio::try_join!(
        activity_source.list("gemini_in_workspace_apps", start_time, None, Some("feature_utilization"), "all"),
        activity_source.list("drive", start_time, None, None, "all"),
    )?;

    let recon_events = parse_recon_events(&raw_recon);
    let egress_events = parse_egress_events(&raw_egress);

    tracing::info!(recon = recon_events.len(), egress = egress_events.len(), "parsed activity batches");

    for recon in &recon_events {
        store
            .record(&recon.actor, recon.timestamp, &recon.app, &recon.action, None)
            .await;
    }

    let egress_events = RevertDetector::detect(egress_events);

    let timezone = chrono_tz::Tz::from_str(&config.timezone)
        .map_err(|_| Error::Config(format!("unknown timezone: {}", config.timezone)))?;

    let file_enricher = Arc::new(FileContextEnricher::new(
        file_metadata_source,
        clock.clone(),
        config.severity_overrides.sensitive_labels.clone(),
    ));

    let intent_classifier = Arc::new(IntentClassifier::new(
        config.suppressions.allowed_external_domains.clone(),
        config.partner_domains.clone(),
        clock,
    ));
    intent_classifier.build_baselines_from_history(&egress_events);

    let canary_doc_ids: HashSet<String> = config.canary_doc_ids.iter().cloned().collect();

    let correlator = Correlator::new(
        store,
        ReconScorer::default(),
        Some(file_enricher),
        intent_classifier,
        canary_doc_ids,
        window_minutes,
        timezone,
    );

    let findings = correlator.correlate(&recon_events, &egress_events).await;
    tracing::info!(count = findings.len(), "detection run complete");

    Ok(findings)
}
