//! ReconStore: persistent append-only per-actor log of recon activities.
//!
//! [`InMemoryReconStore`] is the default, in-process implementation used for
//! tests, standalone runs, and as the degrade-to target when a durable
//! backend (e.g. `recon-store-redis`) is unavailable. Readers observe either
//! the pre- or post-append set for a given actor but never a partially
//! written entry, because each actor's log is guarded by its own lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::scorer::base_score_for_action;
use crate::types::ReconActivity;

/// Append-only per-actor recon activity log with TTL.
#[async_trait]
pub trait ReconStore: Send + Sync {
    /// Append one recon activity under `actor`'s key.
    async fn record(
        &self,
        actor: &str,
        timestamp: DateTime<Utc>,
        app: &str,
        action: &str,
        doc_id: Option<String>,
    );

    /// All retained activities for `actor` (order is not significant).
    async fn activities(&self, actor: &str) -> Vec<ReconActivity>;

    /// Doc ids touched by `actor` within the last `window_hours`, for
    /// activities that carry a `doc_id`.
    async fn recent_doc_ids(&self, actor: &str, window_hours: i64, now: DateTime<Utc>) -> HashSet<String> {
        let cutoff = now - chrono::Duration::hours(window_hours);
        self.activities(actor)
            .await
            .into_iter()
            .filter(|a| a.timestamp >= cutoff)
            .filter_map(|a| a.doc_id)
            .collect()
    }
}

struct Entry {
    activities: Vec<ReconActivity>,
    expires_at: Instant,
}

/// Default in-process `ReconStore`. Each append refreshes the actor's key
/// expiry to `ttl_days`; an expired key behaves as if empty.
pub struct InMemoryReconStore {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryReconStore {
    #[must_use]
    pub fn new(ttl_days: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_days * 24 * 60 * 60),
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryReconStore {
    fn default() -> Self {
        Self::new(14)
    }
}

#[async_trait]
impl ReconStore for InMemoryReconStore {
    async fn record(
        &self,
        actor: &str,
        timestamp: DateTime<Utc>,
        app: &str,
        action: &str,
        doc_id: Option<String>,
    ) {
        let activity = ReconActivity {
            actor: actor.to_string(),
            timestamp,
            app: app.to_string(),
            action: action.to_string(),
            base_score: base_score_for_action(action),
            doc_id,
        };

        let mut guard = self.inner.write();
        let entry = guard.entry(actor.to_string()).or_insert_with(|| Entry {
            activities: Vec::new(),
            expires_at: Instant::now() + self.ttl,
        });
        entry.activities.push(activity);
        entry.expires_at = Instant::now() + self.ttl;
    }

    async fn activities(&self, actor: &str) -> Vec<ReconActivity> {
        let guard = self.inner.read();
        match guard.get(actor) {
            Some(entry) if entry.expires_at > Instant::now() => entry.activities.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(h: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-10T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + chrono::Duration::hours(h)
    }

    #[tokio::test]
    async fn record_then_activities_round_trips() {
        let store = InMemoryReconStore::default();
        store
            .record("alice@example.com", ts(0), "docs", "catch_me_up", Some("D1".into()))
            .await;
        let acts = store.activities("alice@example.com").await;
        assert_eq!(acts.len(), 1);
        assert_eq!(acts[0].base_score, 5.0);
    }

    #[tokio::test]
    async fn unknown_actor_returns_empty() {
        let store = InMemoryReconStore::default();
        assert!(store.activities("nobody@example.com").await.is_empty());
    }

    #[tokio::test]
    async fn recent_doc_ids_filters_by_window() {
        let store = InMemoryReconStore::default();
        store
            .record("alice@example.com", ts(-100), "docs", "summarize", Some("OLD".into()))
            .await;
        store
            .record("alice@example.com", ts(0), "docs", "summarize", Some("NEW".into()))
            .await;
        let recent = store.recent_doc_ids("alice@example.com", 72, ts(0)).await;
        assert!(recent.contains("NEW"));
        assert!(!recent.contains("OLD"));
    }
}
