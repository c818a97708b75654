//! Application Configuration Module
//!
//! Centralizes the configuration for the speaking coach. Settings come from
//! environment variables (optionally via a `.env` file). Missing credentials
//! are not an error: the coach degrades to fallback topics and a disabled
//! journal instead.

use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_GEMINI_MODEL: &str = gemini_client::config::DEFAULT_MODEL;
pub const DEFAULT_GEMINI_BASE_URL: &str = gemini_client::config::BASE_URL;
pub const DEFAULT_SPREADSHEET: &str = sheets_client::config::DEFAULT_SPREADSHEET;
pub const DEFAULT_WORKSHEET: &str = sheets_client::config::DEFAULT_WORKSHEET;
pub const DEFAULT_PROMPTS_DIR: &str = "prompts";

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub gemini_api_key: Option<SecretString>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub journal_credentials: Option<PathBuf>,
    pub journal_spreadsheet: String,
    pub journal_spreadsheet_id: Option<String>,
    pub journal_worksheet: String,
    pub prompts_dir: PathBuf,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GEMINI_API_KEY`: (Optional) Key for the Gemini API. Without it, topics fall back to a fixed one and analysis is unavailable.
    // *   `GEMINI_MODEL`: (Optional) Defaults to "gemini-2.0-flash".
    // *   `GEMINI_BASE_URL`: (Optional) Defaults to the public v1beta endpoint.
    // *   `GOOGLE_APPLICATION_CREDENTIALS` or `JOURNAL_CREDENTIALS`: (Optional) Service-account JSON key. Without it, the journal is disabled.
    // *   `JOURNAL_SPREADSHEET`: (Optional) Spreadsheet title. Defaults to "SPEAKING_JOURNAL".
    // *   `JOURNAL_SPREADSHEET_ID`: (Optional) Spreadsheet id; skips the lookup by title.
    // *   `JOURNAL_WORKSHEET`: (Optional) Defaults to "Speaking_Journal".
    // *   `PROMPTS_DIR`: (Optional) Defaults to "prompts".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = var("GEMINI_API_KEY").map(SecretString::from);
        let gemini_model = var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_base_url =
            var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        if !gemini_base_url.starts_with("http://") && !gemini_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: "GEMINI_BASE_URL",
                reason: format!("expected an http(s) URL, got {gemini_base_url:?}"),
            });
        }

        let journal_credentials = var("GOOGLE_APPLICATION_CREDENTIALS")
            .or_else(|| var("JOURNAL_CREDENTIALS"))
            .map(PathBuf::from);
        let journal_spreadsheet =
            var("JOURNAL_SPREADSHEET").unwrap_or_else(|| DEFAULT_SPREADSHEET.to_string());
        let journal_spreadsheet_id = var("JOURNAL_SPREADSHEET_ID");
        let journal_worksheet =
            var("JOURNAL_WORKSHEET").unwrap_or_else(|| DEFAULT_WORKSHEET.to_string());
        let prompts_dir = PathBuf::from(
            var("PROMPTS_DIR").unwrap_or_else(|| DEFAULT_PROMPTS_DIR.to_string()),
        );

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            journal_credentials,
            journal_spreadsheet,
            journal_spreadsheet_id,
            journal_worksheet,
            prompts_dir,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(
            config.gemini_base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert!(config.journal_credentials.is_none());
        assert_eq!(config.journal_spreadsheet, "SPEAKING_JOURNAL");
        assert!(config.journal_spreadsheet_id.is_none());
        assert_eq!(config.journal_worksheet, "Speaking_Journal");
        assert_eq!(config.prompts_dir, PathBuf::from("prompts"));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "  abc123 "),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("JOURNAL_CREDENTIALS", "/etc/coach/sa.json"),
            ("JOURNAL_SPREADSHEET_ID", "1AbC"),
            ("RUST_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(
            config.gemini_api_key.as_ref().map(|k| k.expose_secret()),
            Some("abc123")
        );
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(
            config.journal_credentials,
            Some(PathBuf::from("/etc/coach/sa.json"))
        );
        assert_eq!(config.journal_spreadsheet_id.as_deref(), Some("1AbC"));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_google_credentials_take_precedence() {
        let config = config_from(&[
            ("GOOGLE_APPLICATION_CREDENTIALS", "/a.json"),
            ("JOURNAL_CREDENTIALS", "/b.json"),
        ])
        .unwrap();
        assert_eq!(config.journal_credentials, Some(PathBuf::from("/a.json")));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = config_from(&[("GEMINI_API_KEY", "   ")]).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("RUST_LOG", "chatty")]),
            Err(ConfigError::InvalidLogLevel(level)) if level == "chatty"
        ));
        assert!(matches!(
            config_from(&[("GEMINI_BASE_URL", "generativelanguage.googleapis.com")]),
            Err(ConfigError::InvalidValue { var: "GEMINI_BASE_URL", .. })
        ));
    }
}
