//! Raw-to-domain parsing: turns `RawActivity` batches from the two
//! `ActivitySource` streams into `ReconEvent`/`EgressEvent` sequences,
//! skipping malformed individual records (error category (d)).

use crate::source::RawActivity;
use crate::types::{EgressEvent, ReconEvent};

/// Assistant actions that count as reconnaissance.
pub const RECON_ACTIONS: &[&str] = &[
    "ask_about_this_file",
    "summarize_file",
    "summarize_long",
    "summarize_proactive_short",
    "ask_about_context",
    "summarize",
    "catch_me_up",
    "ask_about_unspecified_file",
    "summarize_unspecified_file",
    "analyze_documents",
    "report_unspecified_files",
];

/// Apps a recon action must occur in to count.
pub const RECON_APPS: &[&str] = &["docs", "drive", "sheets", "slides"];

/// Substrings of `event_name` that mark a Drive event as egress-relevant.
pub const EXFIL_EVENT_PATTERNS: &[&str] = &[
    "download",
    "export",
    "copy",
    "add_to_folder",
    "change_acl",
    "change_visibility",
    "deny_access_request",
    "request_access",
    "create_shortcut",
    "move",
    "publish_to_web",
    "transfer_ownership",
    "untrash",
];

/// Visibility values considered externally exposed.
pub const HIGH_RISK_VISIBILITY: &[&str] = &["people_with_link", "public_on_the_web", "shared_externally"];

/// Parse Gemini-style activities into `ReconEvent`s. Activities missing
/// `actor_email`/`time`, or whose action/app isn't in the recon set, are
/// skipped (the latter silently, the former with a warning).
#[must_use]
pub fn parse_recon_events(raw: &[RawActivity]) -> Vec<ReconEvent> {
    let mut out = Vec::new();

    for activity in raw {
        let (Some(actor), Some(timestamp)) = (activity.actor_email.as_ref(), activity.time) else {
            tracing::warn!("malformed gemini activity: missing actor or timestamp");
            continue;
        };
        let event_id = activity.unique_qualifier.clone().unwrap_or_default();

        for event in &activity.events {
            let action = event.parameters.get("action").and_then(|v| v.as_str());
            let app_name = event.parameters.get("app_name").and_then(|v| v.as_str());

            let (Some(action), Some(app_name)) = (action, app_name) else {
                continue;
            };

            if RECON_ACTIONS.contains(&action) && RECON_APPS.contains(&app_name) {
                out.push(ReconEvent {
                    actor: actor.clone(),
                    timestamp,
                    app: app_name.to_string(),
                    action: action.to_string(),
                    event_id: event_id.clone(),
                });
            }
        }
    }

    out
}

/// Parse Drive-style activities into `EgressEvent`s, filtering to events
/// whose name matches `EXFIL_EVENT_PATTERNS`. `is_revert` always starts
/// `false`; it is set by [`crate::revert::RevertDetector`].
#[must_use]
pub fn parse_egress_events(raw: &[RawActivity]) -> Vec<EgressEvent> {
    let mut out = Vec::new();

    for activity in raw {
        let (Some(actor), Some(timestamp)) = (activity.actor_email.as_ref(), activity.time) else {
            tracing::warn!("malformed drive activity: missing actor or timestamp");
            continue;
        };
        let event_id = activity.unique_qualifier.clone().unwrap_or_default();
        let ip_address = activity.ip_address.clone();

        for event in &activity.events {
            let event_name = event.name.clone();
            if !EXFIL_EVENT_PATTERNS.iter().any(|p| event_name.contains(p)) {
                continue;
            }

            let params = &event.parameters;
            let str_param = |key: &str| params.get(key).and_then(|v| v.as_str()).map(str::to_string);

            let doc_id = str_param("doc_id").or_else(|| str_param("target_id"));

            out.push(EgressEvent {
                actor: actor.clone(),
                timestamp,
                event_name,
                doc_id,
                doc_title: str_param("doc_title"),
                visibility: str_param("visibility"),
                old_visibility: str_param("old_visibility"),
                new_value: str_param("new_value"),
                old_value: str_param("old_value"),
                owner: str_param("owner"),
                destination_folder_id: str_param("destination_folder_id"),
                event_id: event_id.clone(),
                ip_address: ip_address.clone(),
                is_revert: false,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ParamValue, RawEvent};
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;

    fn ts(iso: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(iso).unwrap().with_timezone(&Utc)
    }

    fn recon_activity(action: &str, app: &str) -> RawActivity {
        let mut parameters = HashMap::new();
        parameters.insert("action".to_string(), ParamValue::Str(action.to_string()));
        parameters.insert("app_name".to_string(), ParamValue::Str(app.to_string()));
        RawActivity {
            actor_email: Some("alice@example.com".into()),
            time: Some(ts("2024-01-10T09:00:00Z")),
            unique_qualifier: Some("evt-1".into()),
            ip_address: None,
            events: vec![RawEvent {
                name: "feature_utilization".into(),
                parameters,
            }],
        }
    }

    #[test]
    fn recognized_recon_action_and_app_produce_event() {
        let events = parse_recon_events(&[recon_activity("catch_me_up", "docs")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "catch_me_up");
        assert_eq!(events[0].app, "docs");
    }

    #[test]
    fn unrecognized_action_is_dropped() {
        let events = parse_recon_events(&[recon_activity("delete_file", "docs")]);
        assert!(events.is_empty());
    }

    #[test]
    fn missing_actor_skips_whole_activity() {
        let mut activity = recon_activity("catch_me_up", "docs");
        activity.actor_email = None;
        assert!(parse_recon_events(&[activity]).is_empty());
    }

    fn egress_activity(event_name: &str, visibility: Option<&str>) -> RawActivity {
        let mut parameters = HashMap::new();
        parameters.insert("doc_id".to_string(), ParamValue::Str("D1".into()));
        if let Some(v) = visibility {
            parameters.insert("visibility".to_string(), ParamValue::Str(v.to_string()));
        }
        RawActivity {
            actor_email: Some("bob@example.com".into()),
            time: Some(ts("2024-01-10T09:05:00Z")),
            unique_qualifier: Some("evt-2".into()),
            ip_address: Some("10.0.0.1".into()),
            events: vec![RawEvent {
                name: event_name.into(),
                parameters,
            }],
        }
    }

    #[test]
    fn matching_pattern_produces_egress_event() {
        let events = parse_egress_events(&[egress_activity("change_acl", Some("shared_externally"))]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].doc_id.as_deref(), Some("D1"));
        assert_eq!(events[0].visibility.as_deref(), Some("shared_externally"));
        assert!(!events[0].is_revert);
    }

    #[test]
    fn non_matching_event_name_is_dropped() {
        let events = parse_egress_events(&[egress_activity("view", None)]);
        assert!(events.is_empty());
    }

    #[test]
    fn target_id_falls_back_when_doc_id_absent() {
        let mut activity = egress_activity("download", None);
        activity.events[0].parameters.remove("doc_id");
        activity.events[0]
            .parameters
            .insert("target_id".to_string(), ParamValue::Str("D2".into()));
        let events = parse_egress_events(&[activity]);
        assert_eq!(events[0].doc_id.as_deref(), Some("D2"));
    }
}
