use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://54.173.209.117/classify-signature/";
pub const DEFAULT_PREVIEW_MAX_DIM: u32 = 512;
pub const CONFIG_FILE_NAME: &str = "config.json";

const ENDPOINT_ENV: &str = "SIGNATURE_CLASSIFIER_URL";
const TIMEOUT_ENV: &str = "SIGNATURE_CLASSIFIER_TIMEOUT_SECS";

/// Runtime settings for the classification pipeline.
///
/// Resolved from defaults, then `config.json` in the app config directory,
/// then environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    /// `None` keeps the HTTP client's default.
    pub request_timeout_secs: Option<u64>,
    pub preview_max_dim: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
            preview_max_dim: DEFAULT_PREVIEW_MAX_DIM,
        }
    }
}

impl AppConfig {
    /// Load from `config_dir/config.json` (if present) and the process environment.
    pub fn load(config_dir: Option<&Path>) -> Self {
        let file = config_dir.map(|dir| dir.join(CONFIG_FILE_NAME));
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(file: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some(path) if path.exists() => match Self::read_file(path) {
                Ok(c) => {
                    log::info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    log::warn!("Ignoring {}: {}", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };

        if let Some(url) = env(ENDPOINT_ENV).filter(|s| !s.trim().is_empty()) {
            config.endpoint = url.trim().to_string();
        }

        if let Some(raw) = env(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout_secs = Some(secs),
                _ => log::warn!("Ignoring {}={:?}: expected a positive integer", TIMEOUT_ENV, raw),
            }
        }

        if let Err(e) = config.validate() {
            log::warn!("{}; falling back to {}", e, DEFAULT_ENDPOINT);
            config.endpoint = DEFAULT_ENDPOINT.to_string();
        }

        config
    }

    fn read_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| AppError {
            message: format!("Failed to parse config JSON: {}", e),
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| AppError {
            message: format!("Invalid endpoint {:?}: {}", self.endpoint, e),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(format!("Invalid endpoint scheme {:?}", other).into()),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_sources() {
        let config = AppConfig::from_sources(None, env_from(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn file_overrides_defaults_partially() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"endpoint":"https://example.com/classify/"}"#).unwrap();

        let config = AppConfig::from_sources(Some(&path), env_from(&[]));
        assert_eq!(config.endpoint, "https://example.com/classify/");
        assert_eq!(config.preview_max_dim, DEFAULT_PREVIEW_MAX_DIM);
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"endpoint":"https://example.com/a/","request_timeout_secs":5}"#,
        )
        .unwrap();

        let config = AppConfig::from_sources(
            Some(&path),
            env_from(&[
                ("SIGNATURE_CLASSIFIER_URL", "http://localhost:9000/b/"),
                ("SIGNATURE_CLASSIFIER_TIMEOUT_SECS", "12"),
            ]),
        );
        assert_eq!(config.endpoint, "http://localhost:9000/b/");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn bad_timeout_is_ignored() {
        let config = AppConfig::from_sources(
            None,
            env_from(&[("SIGNATURE_CLASSIFIER_TIMEOUT_SECS", "soon")]),
        );
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not json").unwrap();

        let config = AppConfig::from_sources(Some(&path), env_from(&[]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn invalid_endpoint_falls_back() {
        let config = AppConfig::from_sources(
            None,
            env_from(&[("SIGNATURE_CLASSIFIER_URL", "ftp://example.com/x")]),
        );
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }
}
