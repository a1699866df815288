use std::{fs, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const CONFIG_FILE: &str = "viewer.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_root: String,
    pub default_model: String,
    pub request_timeout_secs: u64,
    pub history_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_root: "http://localhost:8080".into(),
            default_model: shared::catalog::DEFAULT_MODEL.into(),
            request_timeout_secs: 30,
            history_capacity: 256,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.service_root)
            .with_context(|| format!("invalid service root '{}'", self.service_root))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("service root must be http(s), got '{}'", self.service_root);
        }
        if self.default_model.trim().is_empty() {
            bail!("default model must not be empty");
        }
        if self.request_timeout_secs == 0 {
            bail!("request timeout must be at least one second");
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    service_root: Option<String>,
    default_model: Option<String>,
    request_timeout_secs: Option<u64>,
    history_capacity: Option<usize>,
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(CONFIG_FILE).ok();
    load_settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the config file, then environment variables.
pub fn load_settings_from(raw_file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = raw_file {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.service_root {
                    settings.service_root = v;
                }
                if let Some(v) = file_cfg.default_model {
                    settings.default_model = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = v;
                }
                if let Some(v) = file_cfg.history_capacity {
                    settings.history_capacity = v;
                }
            }
            Err(err) => tracing::warn!(error = %err, file = CONFIG_FILE, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("API_ROOT") {
        settings.service_root = v;
    }
    if let Some(v) = env("APP__SERVICE_ROOT") {
        settings.service_root = v;
    }

    if let Some(v) = env("APP__DEFAULT_MODEL") {
        settings.default_model = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = env("APP__HISTORY_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.history_capacity = parsed;
        }
    }

    settings
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let settings = load_settings_from(None, env_from(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_model, "en_core_web_sm");
        settings.validate().expect("defaults are valid");
    }

    #[test]
    fn file_values_override_defaults() {
        let raw = r#"
            service_root = "https://annotate.example.org/api"
            default_model = "de_core_news_sm"
            request_timeout_secs = 5
        "#;
        let settings = load_settings_from(Some(raw), env_from(&[]));
        assert_eq!(settings.service_root, "https://annotate.example.org/api");
        assert_eq!(settings.default_model, "de_core_news_sm");
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        assert_eq!(settings.history_capacity, 256);
    }

    #[test]
    fn env_overrides_file_and_prefixed_wins() {
        let raw = r#"service_root = "http://from-file:8080""#;
        let settings = load_settings_from(
            Some(raw),
            env_from(&[
                ("API_ROOT", "http://legacy:8080"),
                ("APP__SERVICE_ROOT", "http://prefixed:8080"),
                ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
                ("APP__HISTORY_CAPACITY", "8"),
            ]),
        );
        assert_eq!(settings.service_root, "http://prefixed:8080");
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.history_capacity, 8);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let settings = load_settings_from(Some("service_root = ["), env_from(&[]));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut settings = Settings {
            service_root: "ftp://example.org".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.service_root = "http://localhost:8080".into();
        settings.request_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }
}
