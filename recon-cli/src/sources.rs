//! Live `ActivitySource`/`FileMetadataSource` implementations against the
//! Google Workspace Admin Reports API and Drive API. Authentication itself
//! is out of scope for the correlation engine (`ActivitySource`/
//! `FileMetadataSource` are boundary traits); these implementations expect
//! an already-minted OAuth2 bearer token, read from `GOOGLE_ACCESS_TOKEN`,
//! rather than performing the service-account JWT exchange themselves.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recon_core::error::{Error, Result};
use recon_core::source::{ActivitySource, FileMetadataSource, ParamValue, RawActivity, RawEvent, RawFileMetadata, RawPermission};
use serde::Deserialize;

const REPORTS_BASE: &str = "https://admin.googleapis.com/admin/reports/v1/activity/users";
const DRIVE_BASE: &str = "https://www.googleapis.com/drive/v3/files";

/// `ActivitySource` backed by the Admin SDK Reports API.
pub struct GoogleWorkspaceActivitySource {
    http: reqwest::Client,
    access_token: String,
    customer_id: String,
}

impl GoogleWorkspaceActivitySource {
    #[must_use]
    pub fn new(http: reqwest::Client, access_token: String, customer_id: String) -> Self {
        Self {
            http,
            access_token,
            customer_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActivityListResponse {
    #[serde(default)]
    items: Vec<ActivityItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityItem {
    actor: ActivityActor,
    id: ActivityId,
    #[serde(default)]
    events: Vec<ActivityEventItem>,
}

#[derive(Debug, Deserialize)]
struct ActivityActor {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityId {
    time: Option<String>,
    #[serde(rename = "uniqueQualifier")]
    unique_qualifier: Option<String>,
    #[serde(rename = "ipAddress")]
    ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityEventItem {
    name: String,
    #[serde(default)]
    parameters: Vec<ActivityParameter>,
}

#[derive(Debug, Deserialize)]
struct ActivityParameter {
    name: String,
    value: Option<String>,
    #[serde(rename = "intValue")]
    int_value: Option<String>,
    #[serde(rename = "boolValue")]
    bool_value: Option<bool>,
}

impl From<ActivityItem> for RawActivity {
    fn from(item: ActivityItem) -> Self {
        RawActivity {
            actor_email: item.actor.email,
            time: item.id.time.as_deref().and_then(|t| DateTime::parse_from_rfc3339(t).ok()).map(|t| t.with_timezone(&Utc)),
            unique_qualifier: item.id.unique_qualifier,
            ip_address: item.id.ip_address,
            events: item
                .events
                .into_iter()
                .map(|e| RawEvent {
                    name: e.name,
                    parameters: e
                        .parameters
                        .into_iter()
                        .filter_map(|p| {
                            let value = if let Some(v) = p.value {
                                ParamValue::Str(v)
                            } else if let Some(v) = p.int_value {
                                ParamValue::Int(v.parse().ok()?)
                            } else if let Some(v) = p.bool_value {
                                ParamValue::Bool(v)
                            } else {
                                return None;
                            };
                            Some((p.name, value))
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ActivitySource for GoogleWorkspaceActivitySource {
    async fn list(
        &self,
        application: &str,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        event_name: Option<&str>,
        user_key: &str,
    ) -> Result<Vec<RawActivity>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = format!("{REPORTS_BASE}/{user_key}/applications/{application}");
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&[("customerId", self.customer_id.as_str())])
                .query(&[("startTime", start_time.to_rfc3339())])
                .query(&[("maxResults", "500")]);
            if let Some(end) = end_time {
                request = request.query(&[("endTime", end.to_rfc3339())]);
            }
            if let Some(name) = event_name {
                request = request.query(&[("eventName", name)]);
            }
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.map_err(|e| Error::Transport(e.to_string()))?;
            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                return Err(Error::Auth(format!("admin reports API returned {status}")));
            }
            if !status.is_success() {
                return Err(Error::Transport(format!("admin reports API returned {status}")));
            }

            let body: ActivityListResponse = response.json().await.map_err(|e| Error::Transport(e.to_string()))?;
            out.extend(body.items.into_iter().map(RawActivity::from));

            page_token = body.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(out)
    }
}

/// `FileMetadataSource` backed by the Drive v3 `files.get` endpoint.
pub struct DriveFileMetadataSource {
    http: reqwest::Client,
    access_token: String,
}

impl DriveFileMetadataSource {
    #[must_use]
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self { http, access_token }
    }
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    name: Option<String>,
    #[serde(default)]
    owners: Vec<DriveOwner>,
    #[serde(default)]
    labels: HashMap<String, bool>,
    #[serde(rename = "labelInfo")]
    label_info: Option<DriveLabelInfo>,
    #[serde(default)]
    permissions: Vec<DrivePermission>,
}

#[derive(Debug, Deserialize)]
struct DriveOwner {
    #[serde(rename = "emailAddress")]
    email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveLabelInfo {
    #[serde(default)]
    labels: Vec<DriveLabel>,
}

#[derive(Debug, Deserialize)]
struct DriveLabel {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DrivePermission {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "emailAddress")]
    email_address: Option<String>,
}

#[async_trait]
impl FileMetadataSource for DriveFileMetadataSource {
    async fn get(&self, doc_id: &str, fields: &str) -> Result<Option<RawFileMetadata>> {
        let url = format!("{DRIVE_BASE}/{doc_id}");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", fields), ("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("drive API returned {status}")));
        }
        if !status.is_success() {
            return Err(Error::Transport(format!("drive API returned {status}")));
        }

        let file: DriveFile = response.json().await.map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Some(RawFileMetadata {
            name: file.name.unwrap_or_else(|| "Unknown".to_string()),
            owner_email: file.owners.into_iter().find_map(|o| o.email_address),
            labels_map: file.labels,
            label_info_ids: file.label_info.map(|l| l.labels.into_iter().filter_map(|lbl| lbl.id).collect()).unwrap_or_default(),
            permissions: file
                .permissions
                .into_iter()
                .map(|p| RawPermission {
                    kind: p.kind,
                    email_address: p.email_address,
                })
                .collect(),
        }))
    }
}
