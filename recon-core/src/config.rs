//! Configuration input object, as fetched by the CLI's config loader and
//! passed down to every component that needs it.

use serde::{Deserialize, Serialize};

fn default_customer_id() -> String {
    "my_customer".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Top-level configuration, matching the shape the driver loads from
/// `--config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service_account_path: String,
    pub delegated_user: String,
    #[serde(default = "default_customer_id")]
    pub customer_id: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub canary_doc_ids: Vec<String>,
    #[serde(default)]
    pub suppressions: Suppressions,
    #[serde(default)]
    pub partner_domains: Vec<String>,
    #[serde(default)]
    pub severity_overrides: SeverityOverrides,
    #[serde(default)]
    pub high_risk_folders: Vec<String>,
}

/// Domains whose destination makes an egress event suppressible as
/// legitimate workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suppressions {
    #[serde(default)]
    pub allowed_external_domains: Vec<String>,
}

/// File-label substrings that force a file's sensitivity to `high`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeverityOverrides {
    #[serde(default)]
    pub sensitive_labels: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_absent() {
        let json = r#"{
            "service_account_path": "/etc/sa.json",
            "delegated_user": "admin@example.com"
        }"#;
        let cfg: Config = serde_json::from_str(json).expect("valid config");
        assert_eq!(cfg.customer_id, "my_customer");
        assert_eq!(cfg.timezone, "UTC");
        assert!(cfg.canary_doc_ids.is_empty());
        assert!(cfg.redis_url.is_none());
    }
}
