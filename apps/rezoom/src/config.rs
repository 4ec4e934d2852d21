use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::export::{ExportSettings, PaginationMode};

/// Client configuration loaded from environment variables (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub output_dir: PathBuf,
    pub export_scale: f32,
    pub export_timeout: Duration,
    pub network_timeout: Duration,
    pub pagination: PaginationMode,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key → value source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let export_scale = var("REZOOM_EXPORT_SCALE", "2.0")
            .parse::<f32>()
            .context("REZOOM_EXPORT_SCALE must be a number")?;
        if !export_scale.is_finite() || export_scale < 2.0 {
            bail!("REZOOM_EXPORT_SCALE must be at least 2.0, got {export_scale}");
        }

        let pagination = var("REZOOM_PAGINATION", "multi")
            .parse::<PaginationMode>()
            .map_err(anyhow::Error::msg)
            .context("REZOOM_PAGINATION is invalid")?;

        Ok(Config {
            api_url: var("REZOOM_API_URL", "http://localhost:8080/api"),
            token: get("REZOOM_TOKEN").filter(|t| !t.trim().is_empty()),
            output_dir: PathBuf::from(var("REZOOM_OUTPUT_DIR", ".")),
            export_scale,
            export_timeout: secs(&var("REZOOM_EXPORT_TIMEOUT_SECS", "60"), "REZOOM_EXPORT_TIMEOUT_SECS")?,
            network_timeout: secs(&var("REZOOM_NETWORK_TIMEOUT_SECS", "30"), "REZOOM_NETWORK_TIMEOUT_SECS")?,
            pagination,
            rust_log: var("RUST_LOG", "info"),
        })
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            scale: self.export_scale,
            timeout: self.export_timeout,
            pagination: self.pagination,
            ..ExportSettings::default()
        }
    }
}

fn secs(value: &str, key: &str) -> Result<Duration> {
    let n = value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    if n == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.token, None);
        assert_eq!(config.export_scale, 2.0);
        assert_eq!(config.export_timeout, Duration::from_secs(60));
        assert_eq!(config.network_timeout, Duration::from_secs(30));
        assert_eq!(config.pagination, PaginationMode::MultiPage);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("REZOOM_TOKEN", "abc"),
            ("REZOOM_EXPORT_SCALE", "3"),
            ("REZOOM_PAGINATION", "single"),
            ("REZOOM_OUTPUT_DIR", "/tmp/out"),
        ])
        .unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.export_scale, 3.0);
        assert_eq!(config.pagination, PaginationMode::SinglePage);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.export_settings().validate().is_ok());
    }

    #[test]
    fn test_low_scale_is_rejected() {
        let err = config(&[("REZOOM_EXPORT_SCALE", "1.5")]).unwrap_err();
        assert!(err.to_string().contains("REZOOM_EXPORT_SCALE"));
    }

    #[test]
    fn test_bad_values_name_the_variable() {
        let err = config(&[("REZOOM_NETWORK_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("REZOOM_NETWORK_TIMEOUT_SECS"));

        let err = config(&[("REZOOM_PAGINATION", "both")]).unwrap_err();
        assert!(err.to_string().contains("REZOOM_PAGINATION"));
    }
}
