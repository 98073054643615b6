//! FileContextEnricher: per-document sensitivity, labels, owner, and prior
//! external-share state, cached for the lifetime of a run.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::clock::Clock;
use crate::source::{FileMetadataSource, RawFileMetadata};
use crate::types::{FileContext, FileMetadata, Finding, Sensitivity};

const OWNER_SENSITIVE_TERMS: &[&str] = &["exec", "ceo", "cfo", "finance"];
const LABEL_MEDIUM_TERMS: &[&str] = &["confidential", "restricted", "internal", "sensitive", "private"];

/// Caches and returns per-document `FileMetadata`, enriching `Finding`s
/// in place and applying the file-sensitivity severity upgrade.
pub struct FileContextEnricher {
    source: Arc<dyn FileMetadataSource>,
    clock: Arc<dyn Clock>,
    sensitive_labels: HashSet<String>,
    cache: RwLock<HashMap<String, Option<FileMetadata>>>,
}

impl FileContextEnricher {
    #[must_use]
    pub fn new(
        source: Arc<dyn FileMetadataSource>,
        clock: Arc<dyn Clock>,
        sensitive_labels: Vec<String>,
    ) -> Self {
        Self {
            source,
            clock,
            sensitive_labels: sensitive_labels.into_iter().map(|s| s.to_lowercase()).collect(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Enrich `finding` in place with the file context for `doc_id`,
    /// promoting severity by one step if the file is `high`-sensitivity.
    /// A no-op (no cache entry, no severity change) if lookup fails or the
    /// document is unknown (error categories covered upstream by
    /// [`Self::lookup`]).
    pub async fn enrich_finding(&self, finding: &mut Finding, doc_id: &str) {
        let Some(meta) = self.lookup(doc_id).await else {
            return;
        };

        let is_high = meta.sensitivity == Sensitivity::High;
        finding.file_context = Some(FileContext {
            sensitivity: meta.sensitivity,
            labels: meta.labels,
            owner: meta.owner,
            shared_externally_before: meta.shared_externally_before,
        });

        if is_high {
            let before = finding.severity;
            finding.severity = finding.severity.promote();
            if finding.severity != before {
                finding.reason.push_str(" (high-sensitivity file)");
            }
        }
    }

    /// Look up file metadata for `doc_id`, consulting the cache first.
    pub async fn lookup(&self, doc_id: &str) -> Option<FileMetadata> {
        if let Some(cached) = self.cache.read().get(doc_id) {
            return cached.clone();
        }

        let raw = match self.source.get(doc_id, "name,owners,labels,labelInfo,permissions").await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::warn!(doc_id, "file metadata not found");
                self.cache.write().insert(doc_id.to_string(), None);
                return None;
            }
            Err(e) => {
                tracing::error!(doc_id, error = %e, "error fetching file metadata");
                self.cache.write().insert(doc_id.to_string(), None);
                return None;
            }
        };

        let labels = Self::extract_labels(&raw);
        let owner = raw.owner_email.clone().unwrap_or_else(|| "unknown".to_string());
        let sensitivity = self.determine_sensitivity(&labels, &owner);
        let shared_externally_before = Self::shared_externally(&raw);

        let meta = FileMetadata {
            doc_id: doc_id.to_string(),
            title: raw.name.clone(),
            owner,
            labels,
            sensitivity,
            last_accessed: self.clock.now(),
            shared_externally_before,
        };
        self.cache.write().insert(doc_id.to_string(), Some(meta.clone()));
        Some(meta)
    }

    /// Combine both label shapes the upstream API exposes across
    /// generations: the `labelInfo.labels[].id` list and the `labels` map.
    fn extract_labels(raw: &RawFileMetadata) -> Vec<String> {
        let mut labels: Vec<String> = raw.label_info_ids.clone();
        for (key, value) in &raw.labels_map {
            if *value {
                labels.push(key.clone());
            }
        }
        labels
    }

    fn determine_sensitivity(&self, labels: &[String], owner: &str) -> Sensitivity {
        let lower_labels: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();

        if self
            .sensitive_labels
            .iter()
            .any(|sensitive| lower_labels.iter().any(|l| l.contains(sensitive.as_str())))
        {
            return Sensitivity::High;
        }

        let owner_lower = owner.to_lowercase();
        if OWNER_SENSITIVE_TERMS.iter().any(|term| owner_lower.contains(term)) {
            return Sensitivity::High;
        }

        if LABEL_MEDIUM_TERMS
            .iter()
            .any(|term| lower_labels.iter().any(|l| l.contains(term)))
        {
            return Sensitivity::Medium;
        }

        Sensitivity::Low
    }

    fn shared_externally(raw: &RawFileMetadata) -> bool {
        raw.permissions.iter().any(|p| {
            p.kind == "anyone"
                || p.email_address.as_deref().unwrap_or("").is_empty()
                || !p.email_address.as_deref().unwrap_or("").contains('@')
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::Utc;
    use std::collections::HashMap as StdHashMap;

    struct FixtureSource(Option<RawFileMetadata>);

    #[async_trait::async_trait]
    impl FileMetadataSource for FixtureSource {
        async fn get(&self, _doc_id: &str, _fields: &str) -> crate::error::Result<Option<RawFileMetadata>> {
            Ok(self.0.clone())
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc::now()))
    }

    #[tokio::test]
    async fn sensitive_label_wins_over_everything() {
        let raw = RawFileMetadata {
            name: "Q4 Plan".into(),
            owner_email: Some("alice@example.com".into()),
            labels_map: StdHashMap::new(),
            label_info_ids: vec!["TOP_SECRET".into()],
            permissions: vec![],
        };
        let enricher = FileContextEnricher::new(
            Arc::new(FixtureSource(Some(raw))),
            clock(),
            vec!["top_secret".into()],
        );
        let ctx = enricher.lookup("D1").await.expect("context");
        assert_eq!(ctx.sensitivity, Sensitivity::High);
    }

    #[tokio::test]
    async fn exec_owner_is_high_sensitivity() {
        let raw = RawFileMetadata {
            name: "Budget".into(),
            owner_email: Some("jane.cfo@example.com".into()),
            labels_map: StdHashMap::new(),
            label_info_ids: vec![],
            permissions: vec![],
        };
        let enricher = FileContextEnricher::new(Arc::new(FixtureSource(Some(raw))), clock(), vec![]);
        let ctx = enricher.lookup("D1").await.expect("context");
        assert_eq!(ctx.sensitivity, Sensitivity::High);
    }

    #[tokio::test]
    async fn restricted_label_is_medium() {
        let mut labels_map = StdHashMap::new();
        labels_map.insert("confidential-draft".to_string(), true);
        let raw = RawFileMetadata {
            name: "Draft".into(),
            owner_email: Some("bob@example.com".into()),
            labels_map,
            label_info_ids: vec![],
            permissions: vec![],
        };
        let enricher = FileContextEnricher::new(Arc::new(FixtureSource(Some(raw))), clock(), vec![]);
        let ctx = enricher.lookup("D1").await.expect("context");
        assert_eq!(ctx.sensitivity, Sensitivity::Medium);
    }

    #[tokio::test]
    async fn missing_metadata_leaves_finding_unchanged() {
        let enricher = FileContextEnricher::new(Arc::new(FixtureSource(None)), clock(), vec![]);
        assert!(enricher.lookup("D404").await.is_none());
    }
}
