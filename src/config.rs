//! Engine configuration
//!
//! Loaded from a JSON file; every field has a default, so `{}` is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("invalid config JSON: {0}")]
    Parse(String),

    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Retry policy for a document store that is briefly unreachable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRetryConfig {
    /// Total attempts, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt, doubled afterwards (default: 25ms)
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    25
}

impl Default for StoreRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl StoreRetryConfig {
    /// Backoff before attempt number `attempt` (1-based; attempt 1 has none)
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (attempt - 2).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bucket holding graphics, voices and published archives
    #[serde(default = "default_material_bucket")]
    pub material_bucket: String,

    /// Upper bound on blob fetches running at once during export
    #[serde(default = "default_max_in_flight_fetches")]
    pub max_in_flight_fetches: usize,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// Bundle recorded narration under `voices/` (default: false)
    #[serde(default)]
    pub include_voices: bool,

    /// `{id}` is replaced by the background image id
    #[serde(default = "default_background_image_url_template")]
    pub background_image_url_template: String,

    #[serde(default)]
    pub store_retry: StoreRetryConfig,

    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,

    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,

    /// Base address signed URLs are rendered against
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_material_bucket() -> String {
    "material".to_string()
}

fn default_max_in_flight_fetches() -> usize {
    8
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_publish_timeout_ms() -> u64 {
    30_000
}

fn default_background_image_url_template() -> String {
    "/material/background/{id}.jpg".to_string()
}

fn default_signed_url_ttl_secs() -> u64 {
    900
}

fn default_signing_secret() -> String {
    "lessonpack-dev-secret".to_string()
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            material_bucket: default_material_bucket(),
            max_in_flight_fetches: default_max_in_flight_fetches(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            publish_timeout_ms: default_publish_timeout_ms(),
            include_voices: false,
            background_image_url_template: default_background_image_url_template(),
            store_retry: StoreRetryConfig::default(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            signing_secret: default_signing_secret(),
            public_base_url: default_public_base_url(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.material_bucket.is_empty() || self.material_bucket.contains('/') {
            return Err(ConfigError::Invalid {
                field: "material_bucket",
                message: format!("'{}' is not a bucket name", self.material_bucket),
            });
        }
        if self.max_in_flight_fetches == 0 {
            return Err(ConfigError::Invalid {
                field: "max_in_flight_fetches",
                message: "must be > 0".into(),
            });
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_ms",
                message: "must be > 0".into(),
            });
        }
        if self.publish_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "publish_timeout_ms",
                message: "must be > 0".into(),
            });
        }
        if self.store_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "store_retry.max_attempts",
                message: "must be > 0".into(),
            });
        }
        if !self.background_image_url_template.contains("{id}") {
            return Err(ConfigError::Invalid {
                field: "background_image_url_template",
                message: "must contain {id}".into(),
            });
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    /// Display URL for a background image; `None` when no image is set
    pub fn background_image_url(&self, background_image_id: i64) -> Option<String> {
        if background_image_id == 0 {
            return None;
        }
        Some(
            self.background_image_url_template
                .replace("{id}", &background_image_id.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.material_bucket, "material");
        assert_eq!(config.max_in_flight_fetches, 8);
        assert!(!config.include_voices);
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lessonpack.json");
        std::fs::write(
            &path,
            r#"{"material_bucket":"lessons","include_voices":true,"store_retry":{"max_attempts":5}}"#,
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.material_bucket, "lessons");
        assert!(config.include_voices);
        assert_eq!(config.store_retry.max_attempts, 5);
        assert_eq!(config.store_retry.backoff_ms, 25);
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::load(Path::new("/nonexistent/lessonpack.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = EngineConfig::from_json(r#"{"max_in_flight_fetches":0}"#);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "max_in_flight_fetches", .. })
        ));
    }

    #[test]
    fn test_template_requires_placeholder() {
        let result = EngineConfig::from_json(r#"{"background_image_url_template":"/bg.jpg"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_background_image_url() {
        let config = EngineConfig::default();
        assert_eq!(config.background_image_url(0), None);
        assert_eq!(
            config.background_image_url(12).as_deref(),
            Some("/material/background/12.jpg")
        );
    }

    #[test]
    fn test_backoff_doubles() {
        let retry = StoreRetryConfig::default();
        assert_eq!(retry.backoff_before(1), Duration::ZERO);
        assert_eq!(retry.backoff_before(2), Duration::from_millis(25));
        assert_eq!(retry.backoff_before(3), Duration::from_millis(50));
    }
}
