//! Writes findings as a JSON array, to stdout or to a file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use recon_core::Finding;

/// Serialize `findings` as a pretty-printed JSON array and write it to
/// `path`, or to stdout when `path` is `None`.
pub fn write_findings(findings: &[Finding], path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(findings).context("serializing findings")?;

    match path {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing findings to {}", path.display()))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(json.as_bytes()).context("writing findings to stdout")?;
            handle.write_all(b"\n").context("writing findings to stdout")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::types::Severity;
    use std::collections::HashMap;

    fn finding() -> Finding {
        Finding {
            severity: Severity::High,
            actor: "alice@example.com".into(),
            exfil_event: "download".into(),
            exfil_time: "2026-01-01T00:00:00+00:00".into(),
            doc_id: None,
            doc_title: None,
            recon_action: "summarize".into(),
            recon_time: "2026-01-01T00:00:00+00:00".into(),
            delta_minutes: 1.0,
            visibility: None,
            reason: "test".into(),
            event_ids: HashMap::new(),
            recon_score: None,
            file_context: None,
            intent_analysis: None,
            reason_codes: vec![],
            ip_address: None,
            geo_anomaly: None,
        }
    }

    #[test]
    fn writes_a_json_array_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_findings(&[finding()], Some(&path)).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Finding> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn writes_an_empty_array_when_there_are_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_findings(&[], Some(&path)).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "[]");
    }
}
