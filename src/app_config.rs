use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

/// Application configuration module
/// This module handles loading and validating the configuration file.
/// Command line flags are applied on top of it in `main`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language the subtitles are translated into
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Language of the subtitles; detected by the provider when unset
    #[serde(default)]
    pub source_language: Option<String>,

    /// Translation provider settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Note model used for every card in the deck
    #[serde(default)]
    pub deck: DeckConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Google Cloud Translation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Service endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key; usually supplied through the environment instead
    #[serde(default = "String::new")]
    pub api_key: String,

    /// OAuth access token (`gcloud auth print-access-token`), used instead of a key
    #[serde(default = "String::new")]
    pub access_token: String,

    /// Project billed for token-authenticated requests (`x-goog-user-project`)
    #[serde(default)]
    pub quota_project: Option<String>,

    /// Format of the source text as understood by the API
    #[serde(default)]
    pub format: TextFormat,

    /// Translation model (`base` or `nmt`); API default when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            access_token: String::new(),
            quota_project: None,
            format: TextFormat::default(),
            model: None,
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Source text format sent to the translation API
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    #[default]
    Html,
    Text,
}

impl TextFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
        }
    }
}

/// Note model settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeckConfig {
    /// Model identifier; keep it stable so re-imports update existing notes
    #[serde(default = "default_model_id")]
    pub model_id: i64,

    /// Model display name
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Card stylesheet
    #[serde(default = "default_css")]
    pub css: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            model_name: default_model_name(),
            css: default_css(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_endpoint() -> String {
    "https://translation.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_model_id() -> i64 {
    1956853792
}

fn default_model_name() -> String {
    "Simple Model".to_string()
}

fn default_css() -> String {
    ".card {\n font-family: arial;\n font-size: 20px;\n text-align: center;\n color: black;\n background-color: white;\n}\n".to_string()
}

impl Config {
    /// Load the configuration file, or fall back to defaults when it is missing
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file not found at '{}', using defaults", path.display());
            return Ok(Self::default());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_target_language(&self.target_language)?;
        if let Some(source) = &self.source_language {
            crate::language_utils::validate_target_language(source)
                .with_context(|| format!("Invalid source language: {}", source))?;
        }

        Url::parse(&self.translation.endpoint)
            .with_context(|| format!("Invalid translation endpoint: {}", self.translation.endpoint))?;

        if self.translation.api_key.trim().is_empty() && self.translation.access_token.trim().is_empty() {
            return Err(anyhow!(
                "Translation API key or access token is required (set GOOGLE_TRANSLATE_API_KEY or GOOGLE_TRANSLATE_ACCESS_TOKEN)"
            ));
        }

        if self.deck.model_name.trim().is_empty() {
            return Err(anyhow!("Deck model name cannot be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            source_language: None,
            translation: TranslationConfig::default(),
            deck: DeckConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
