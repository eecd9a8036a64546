//! Configuration management for idcheck using the prefer crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default verification endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://your-backend.com/api/kyc/submit";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Verification service endpoint receiving the multipart submission.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// User agent for HTTP requests (None = built-in default).
    pub user_agent: Option<String>,
    /// Tesseract language setting.
    pub ocr_language: String,
    /// Tesseract executable name or path.
    pub ocr_binary: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: 30,
            user_agent: None,
            ocr_language: "eng".to_string(),
            ocr_binary: "tesseract".to_string(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Verification service endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Tesseract language, e.g. "eng" or "eng+fra".
    #[serde(default)]
    pub ocr_language: Option<String>,
    /// Tesseract executable. A leading `~` is expanded.
    #[serde(default)]
    pub ocr_binary: Option<String>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers idcheck config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("idcheck").await {
            Ok(pref_config) => {
                let endpoint: Option<String> = pref_config.get("endpoint").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let ocr_language: Option<String> = pref_config.get("ocr_language").ok();
                let ocr_binary: Option<String> = pref_config.get("ocr_binary").ok();

                Config {
                    endpoint,
                    request_timeout,
                    user_agent,
                    ocr_language,
                    ocr_binary,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref endpoint) = self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(ref lang) = self.ocr_language {
            settings.ocr_language = lang.clone();
        }
        if let Some(ref binary) = self.ocr_binary {
            settings.ocr_binary = shellexpand::tilde(binary).into_owned();
        }
    }
}

/// Load settings from configuration.
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.ocr_language, "eng");
        assert!(settings.user_agent.is_none());
    }

    #[test]
    fn test_empty_config_changes_nothing() {
        let mut settings = Settings::default();
        Config::default().apply_to_settings(&mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_apply_overrides() {
        let config = Config {
            endpoint: Some("http://localhost:8080/kyc".to_string()),
            request_timeout: Some(5),
            user_agent: Some("Tester/1.0".to_string()),
            ocr_language: Some("eng+fra".to_string()),
            ocr_binary: Some("/opt/tesseract/bin/tesseract".to_string()),
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.endpoint, "http://localhost:8080/kyc");
        assert_eq!(settings.request_timeout, 5);
        assert_eq!(settings.user_agent.as_deref(), Some("Tester/1.0"));
        assert_eq!(settings.ocr_language, "eng+fra");
        assert_eq!(settings.ocr_binary, "/opt/tesseract/bin/tesseract");
    }

    #[test]
    fn test_config_deserializes_partial() {
        let config: Config = serde_json::from_str(r#"{"endpoint": "http://x/y"}"#).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://x/y"));
        assert!(config.request_timeout.is_none());
    }
}
