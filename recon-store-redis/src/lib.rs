//! Durable `ReconStore` backend: per-actor recon logs as a JSON blob in
//! Redis, refreshed to `ttl_days` on every append. Degrades permanently to
//! an in-process fallback for the remainder of the process lifetime on the
//! first backend error, per the store's degrade contract — it never
//! surfaces a backend failure to callers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recon_core::audit;
use recon_core::store::InMemoryReconStore;
use recon_core::types::ReconActivity;
use recon_core::ReconStore;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;

/// Redis-backed `ReconStore`. Construct with [`RedisReconStore::new`]; the
/// connection is established lazily on first use.
pub struct RedisReconStore {
    client: Client,
    manager: RwLock<Option<ConnectionManager>>,
    fallback: Arc<InMemoryReconStore>,
    ttl_seconds: u64,
    degraded: AtomicBool,
}

impl RedisReconStore {
    /// Parse `redis_url` and prepare a store; does not connect until the
    /// first `record`/`activities` call.
    pub fn new(redis_url: &str, ttl_days: u64) -> redis::RedisResult<Self> {
        Ok(Self {
            client: Client::open(redis_url)?,
            manager: RwLock::new(None),
            fallback: Arc::new(InMemoryReconStore::new(ttl_days)),
            ttl_seconds: ttl_days * 24 * 60 * 60,
            degraded: AtomicBool::new(false),
        })
    }

    async fn connection(&self) -> Option<ConnectionManager> {
        if let Some(existing) = self.manager.read().await.as_ref() {
            return Some(existing.clone());
        }
        match self.client.get_connection_manager().await {
            Ok(manager) => {
                *self.manager.write().await = Some(manager.clone());
                Some(manager)
            }
            Err(e) => {
                self.degrade(&e.to_string());
                None
            }
        }
    }

    fn degrade(&self, error: &str) {
        if !self.degraded.swap(true, Ordering::SeqCst) {
            audit::log_store_degraded("redis", error);
        }
    }

    fn key(actor: &str) -> String {
        format!("recon:{actor}")
    }
}

#[async_trait]
impl ReconStore for RedisReconStore {
    async fn record(&self, actor: &str, timestamp: DateTime<Utc>, app: &str, action: &str, doc_id: Option<String>) {
        if self.degraded.load(Ordering::SeqCst) {
            self.fallback.record(actor, timestamp, app, action, doc_id).await;
            return;
        }

        let Some(mut conn) = self.connection().await else {
            self.fallback.record(actor, timestamp, app, action, doc_id).await;
            return;
        };

        let key = Self::key(actor);
        let activity = ReconActivity {
            actor: actor.to_string(),
            timestamp,
            app: app.to_string(),
            action: action.to_string(),
            base_score: recon_core::scorer::base_score_for_action(action),
            doc_id,
        };

        let result: redis::RedisResult<()> = async {
            let existing: Option<String> = conn.get(&key).await?;
            let mut activities: Vec<ReconActivity> = existing
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok())
                .unwrap_or_default();
            activities.push(activity.clone());
            let payload = serde_json::to_string(&activities)
                .map_err(|e| redis::RedisError::from((redis::ErrorKind::TypeError, "serialize", e.to_string())))?;
            conn.set_ex::<_, _, ()>(&key, payload, self.ttl_seconds).await
        }
        .await;

        if let Err(e) = result {
            self.degrade(&e.to_string());
            self.fallback.record(actor, timestamp, app, action, activity.doc_id).await;
        }
    }

    async fn activities(&self, actor: &str) -> Vec<ReconActivity> {
        if self.degraded.load(Ordering::SeqCst) {
            return self.fallback.activities(actor).await;
        }

        let Some(mut conn) = self.connection().await else {
            return self.fallback.activities(actor).await;
        };

        let key = Self::key(actor);
        let result: redis::RedisResult<Vec<ReconActivity>> = async {
            let existing: Option<String> = conn.get(&key).await?;
            Ok(existing.as_deref().and_then(|s| serde_json::from_str(s).ok()).unwrap_or_default())
        }
        .await;

        match result {
            Ok(activities) => activities,
            Err(e) => {
                self.degrade(&e.to_string());
                self.fallback.activities(actor).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_an_unparseable_url() {
        assert!(RedisReconStore::new("not-a-url", 14).is_err());
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_to_fallback_on_first_use() {
        let store = RedisReconStore::new("redis://127.0.0.1:1", 14).expect("url parses");
        store.record("alice@example.com", Utc::now(), "docs", "catch_me_up", None).await;
        assert!(store.degraded.load(Ordering::SeqCst));
        let activities = store.activities("alice@example.com").await;
        assert_eq!(activities.len(), 1);
    }
}
