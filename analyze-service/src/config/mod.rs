use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Gemini API base URL.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for label analysis unless overridden.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Inbound body limit (4.5 MiB), the request size accepted by the original
/// serverless deployment.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4_718_592;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub http: HttpSettings,
    /// OTLP collector for span export; disabled when unset.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    /// Inference service credential. Allowed to be absent at startup; each
    /// request reports it as a configuration error instead.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
}

impl GeminiSettings {
    /// The credential, if present and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret().as_str())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub cors_allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl AnalyzeConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the service config from `lookup`, which resolves variable names
    /// to values (the process environment in production).
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let max_body_bytes = match lookup("ANALYZE_MAX_BODY_BYTES") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "ANALYZE_MAX_BODY_BYTES must be a byte count, got '{}': {}",
                    raw,
                    e
                ))
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(AnalyzeConfig {
            common,
            gemini: GeminiSettings {
                api_key: lookup("GEMINI_API_KEY").map(Secret::new),
                model: get("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                api_base: get("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE)
                    .trim_end_matches('/')
                    .to_string(),
            },
            http: HttpSettings {
                cors_allowed_origins,
                max_body_bytes,
            },
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn common() -> core_config::Config {
        core_config::Config {
            port: 0,
            log_level: "info".to_string(),
        }
    }

    fn load(vars: &[(&str, &str)]) -> Result<AnalyzeConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AnalyzeConfig::from_lookup(common(), |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert!(config.gemini.api_key().is_none());
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini.api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.http.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert!(config.http.cors_allowed_origins.is_empty());
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let config = load(&[("GEMINI_API_KEY", "")]).unwrap();
        assert!(config.gemini.api_key().is_none());

        let config = load(&[("GEMINI_API_KEY", "secret")]).unwrap();
        assert_eq!(config.gemini.api_key(), Some("secret"));
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let config = load(&[("GEMINI_API_KEY", "very-secret-key")]).unwrap();
        assert!(!format!("{:?}", config).contains("very-secret-key"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_API_BASE", "http://127.0.0.1:9000/v1beta/"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("ANALYZE_MAX_BODY_BYTES", "1024"),
        ])
        .unwrap();

        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.api_base, "http://127.0.0.1:9000/v1beta");
        assert_eq!(
            config.http.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.http.max_body_bytes, 1024);
    }

    #[test]
    fn invalid_body_limit_is_a_config_error() {
        let err = load(&[("ANALYZE_MAX_BODY_BYTES", "lots")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
