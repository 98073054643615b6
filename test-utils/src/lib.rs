//! Fixture `ActivitySource`/`FileMetadataSource` implementations shared by
//! `recon-core` and `recon-cli` integration tests. Not published; exists to
//! let tests exercise the pipeline driver without live credentials.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recon_core::error::Result;
use recon_core::source::{ActivitySource, FileMetadataSource, RawActivity, RawFileMetadata};

/// Replays a fixed set of `RawActivity` records per `application_name`,
/// ignoring the requested time range and event-name filter (tests control
/// content by choosing which fixtures to construct).
#[derive(Debug, Clone, Default)]
pub struct FixtureActivitySource {
    by_application: HashMap<String, Vec<RawActivity>>,
}

impl FixtureActivitySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, application: &str, activities: Vec<RawActivity>) -> Self {
        self.by_application.insert(application.to_string(), activities);
        self
    }
}

#[async_trait]
impl ActivitySource for FixtureActivitySource {
    async fn list(
        &self,
        application: &str,
        _start_time: DateTime<Utc>,
        _end_time: Option<DateTime<Utc>>,
        _event_name: Option<&str>,
        _user_key: &str,
    ) -> Result<Vec<RawActivity>> {
        Ok(self.by_application.get(application).cloned().unwrap_or_default())
    }
}

/// Serves a fixed map of `doc_id` to metadata; unknown ids return the
/// typed "not found" response.
#[derive(Debug, Clone, Default)]
pub struct FixtureFileMetadataSource {
    by_doc_id: HashMap<String, RawFileMetadata>,
}

impl FixtureFileMetadataSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, doc_id: &str, metadata: RawFileMetadata) -> Self {
        self.by_doc_id.insert(doc_id.to_string(), metadata);
        self
    }
}

#[async_trait]
impl FileMetadataSource for FixtureFileMetadataSource {
    async fn get(&self, doc_id: &str, _fields: &str) -> Result<Option<RawFileMetadata>> {
        Ok(self.by_doc_id.get(doc_id).cloned())
    }
}
