//! Config loading: resolve a `--config` path (or the `RECON_CONFIG` env var,
//! or a default search path) and deserialize it by file extension.

use std::path::{Path, PathBuf};

use anyhow::Result;
use recon_core::{Config, Error};

const DEFAULT_SEARCH_PATHS: &[&str] = &["./recon.toml", "./recon.yaml", "./recon.json", "/etc/recon/config.toml"];

/// Load configuration from `explicit_path`, falling back to `RECON_CONFIG`
/// and then the default search path list, in that order. Every failure here
/// is a `recon_core::Error::Config` (exit code 2), never a bare `anyhow`
/// message, so the CLI driver can classify it correctly.
pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
    let path = resolve_path(explicit_path)?;
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("reading config file {}: {e}", path.display())))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {} as YAML: {e}", path.display())))?,
        Some("toml") => {
            toml::from_str(&raw).map_err(|e| Error::Config(format!("parsing {} as TOML: {e}", path.display())))?
        }
        _ => serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {} as JSON: {e}", path.display())))?,
    };

    Ok(config)
}

fn resolve_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit_path {
        return Ok(p.to_path_buf());
    }

    if let Ok(env_path) = std::env::var("RECON_CONFIG") {
        return Ok(PathBuf::from(env_path));
    }

    DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from).find(|p| p.exists()).ok_or_else(|| {
        Error::Config(format!("no config file given and none found at default search paths: {DEFAULT_SEARCH_PATHS:?}")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_toml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"service_account_path = "/etc/sa.json"
delegated_user = "admin@example.com""#).unwrap();
        let config = load(Some(file.path())).expect("loads");
        assert_eq!(config.delegated_user, "admin@example.com");
        assert_eq!(config.customer_id, "my_customer");
    }

    #[test]
    fn loads_json_by_default_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(
            file,
            r#"{{"service_account_path": "/etc/sa.json", "delegated_user": "admin@example.com", "timezone": "America/New_York"}}"#
        )
        .unwrap();
        let config = load(Some(file.path())).expect("loads");
        assert_eq!(config.timezone, "America/New_York");
    }

    #[test]
    fn missing_explicit_path_errors() {
        assert!(load(Some(Path::new("/nonexistent/recon.toml"))).is_err());
    }

    #[test]
    fn no_path_and_no_default_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::env::remove_var("RECON_CONFIG");
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let result = load(None);
        std::env::set_current_dir(original).unwrap();
        assert!(result.is_err());
    }
}
