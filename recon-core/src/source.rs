//! External boundaries: `ActivitySource` (paginated upstream activity
//! listing) and `FileMetadataSource` (per-document metadata lookup).
//!
//! Raw upstream shapes are heterogeneous — event parameters come back as
//! string, integer, or boolean values. [`ParamValue`] models that without
//! leaking a generic JSON value into the domain records in [`crate::types`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// A single upstream event parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl ParamValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One upstream event within an activity record.
#[derive(Debug, Clone, Default)]
pub struct RawEvent {
    pub name: String,
    pub parameters: HashMap<String, ParamValue>,
}

/// One raw activity record as returned by `activities().list()`.
#[derive(Debug, Clone)]
pub struct RawActivity {
    pub actor_email: Option<String>,
    pub time: Option<DateTime<Utc>>,
    pub unique_qualifier: Option<String>,
    pub ip_address: Option<String>,
    pub events: Vec<RawEvent>,
}

/// Paginated activity listing boundary.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// List raw activities for `application` in `[start_time, end_time)`,
    /// optionally filtered to a single `event_name`. Pagination is the
    /// implementor's responsibility; the returned vector is the fully
    /// materialized result.
    async fn list(
        &self,
        application: &str,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        event_name: Option<&str>,
        user_key: &str,
    ) -> Result<Vec<RawActivity>>;
}

/// A single permission entry on a file.
#[derive(Debug, Clone)]
pub struct RawPermission {
    pub kind: String,
    pub email_address: Option<String>,
}

/// Raw per-document metadata as returned by the file metadata source.
#[derive(Debug, Clone)]
pub struct RawFileMetadata {
    pub name: String,
    pub owner_email: Option<String>,
    /// `labels` map form (older API generation).
    pub labels_map: HashMap<String, bool>,
    /// `labelInfo.labels[].id` list form (newer API generation).
    pub label_info_ids: Vec<String>,
    pub permissions: Vec<RawPermission>,
}

/// Per-document metadata lookup boundary.
#[async_trait]
pub trait FileMetadataSource: Send + Sync {
    /// Fetch metadata for `doc_id`. Returns `Ok(None)` for a typed
    /// "not found" response (error category (e): no enrichment, not a
    /// failure).
    async fn get(&self, doc_id: &str, fields: &str) -> Result<Option<RawFileMetadata>>;
}
