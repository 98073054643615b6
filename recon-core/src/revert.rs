//! RevertDetector: flags visibility-flip evasion — an external exposure
//! followed by a rapid revert to internal for the same document.

use std::collections::HashMap;

use crate::ingest::HIGH_RISK_VISIBILITY;
use crate::types::EgressEvent;

const REVERT_WINDOW_MINUTES: i64 = 10;

/// Post-processes a batch of egress events, setting `is_revert` on both
/// halves of any qualifying visibility flip. Idempotent: running it twice
/// over its own output yields the same flags, since it only ever sets
/// `is_revert` from `false` to `true` based on `visibility`/timestamp, which
/// it never modifies.
pub struct RevertDetector;

impl RevertDetector {
    /// Detect reverts across `events`, returning a new vector with
    /// `is_revert` set where appropriate. Consumes `events` to avoid a
    /// defensive clone; callers that need the originals should clone first.
    #[must_use]
    pub fn detect(events: Vec<EgressEvent>) -> Vec<EgressEvent> {
        let mut by_doc: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, event) in events.iter().enumerate() {
            if let Some(doc_id) = &event.doc_id {
                if event.event_name.to_lowercase().contains("visibility") {
                    by_doc.entry(doc_id.clone()).or_default().push(idx);
                }
            }
        }

        let mut events = events;
        for indices in by_doc.into_values() {
            let mut sorted = indices;
            sorted.sort_by_key(|&i| events[i].timestamp);

            for window in sorted.windows(2) {
                let (curr_idx, next_idx) = (window[0], window[1]);
                let delta_minutes =
                    (events[next_idx].timestamp - events[curr_idx].timestamp).num_seconds() as f64 / 60.0;
                if delta_minutes > REVERT_WINDOW_MINUTES as f64 {
                    continue;
                }

                let curr_external = events[curr_idx]
                    .visibility
                    .as_deref()
                    .is_some_and(|v| HIGH_RISK_VISIBILITY.contains(&v));
                let next_internal = !events[next_idx]
                    .visibility
                    .as_deref()
                    .is_some_and(|v| HIGH_RISK_VISIBILITY.contains(&v));

                if curr_external && next_internal {
                    events[curr_idx].is_revert = true;
                    events[next_idx].is_revert = true;
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(iso: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(iso).unwrap().with_timezone(&Utc)
    }

    fn visibility_event(doc_id: &str, time: &str, visibility: &str) -> EgressEvent {
        EgressEvent {
            actor: "alice@example.com".into(),
            timestamp: ts(time),
            event_name: "change_user_visibility".into(),
            doc_id: Some(doc_id.into()),
            doc_title: None,
            visibility: Some(visibility.into()),
            old_visibility: None,
            new_value: None,
            old_value: None,
            owner: None,
            destination_folder_id: None,
            event_id: format!("{doc_id}-{time}"),
            ip_address: None,
            is_revert: false,
        }
    }

    #[test]
    fn rapid_external_then_internal_flags_both() {
        let events = vec![
            visibility_event("D2", "2024-01-10T09:00:00Z", "public_on_the_web"),
            visibility_event("D2", "2024-01-10T09:04:00Z", "private"),
        ];
        let result = RevertDetector::detect(events);
        assert!(result[0].is_revert);
        assert!(result[1].is_revert);
    }

    #[test]
    fn slow_revert_past_window_is_not_flagged() {
        let events = vec![
            visibility_event("D2", "2024-01-10T09:00:00Z", "public_on_the_web"),
            visibility_event("D2", "2024-01-10T09:15:00Z", "private"),
        ];
        let result = RevertDetector::detect(events);
        assert!(!result[0].is_revert);
        assert!(!result[1].is_revert);
    }

    #[test]
    fn external_to_external_is_not_a_revert() {
        let events = vec![
            visibility_event("D2", "2024-01-10T09:00:00Z", "public_on_the_web"),
            visibility_event("D2", "2024-01-10T09:04:00Z", "shared_externally"),
        ];
        let result = RevertDetector::detect(events);
        assert!(!result[0].is_revert);
        assert!(!result[1].is_revert);
    }

    #[test]
    fn different_docs_are_independent() {
        let events = vec![
            visibility_event("D1", "2024-01-10T09:00:00Z", "public_on_the_web"),
            visibility_event("D2", "2024-01-10T09:01:00Z", "private"),
        ];
        let result = RevertDetector::detect(events);
        assert!(!result[0].is_revert);
        assert!(!result[1].is_revert);
    }

    #[test]
    fn detection_is_idempotent() {
        let events = vec![
            visibility_event("D2", "2024-01-10T09:00:00Z", "public_on_the_web"),
            visibility_event("D2", "2024-01-10T09:04:00Z", "private"),
        ];
        let once = RevertDetector::detect(events);
        let twice = RevertDetector::detect(once.clone());
        assert_eq!(once, twice);
    }
}
