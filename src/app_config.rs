use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// OpenSubtitles catalog access
    #[serde(default)]
    pub opensubtitles: OpenSubtitlesConfig,

    /// Translation model access
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batch planning and persistence settings
    #[serde(default)]
    pub job: JobConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// OpenSubtitles API configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenSubtitlesConfig {
    /// API key for the OpenSubtitles REST API
    #[serde(default = "String::new")]
    pub api_key: String,

    /// User agent string required by the API
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Service endpoint URL
    #[serde(default = "default_opensubtitles_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenSubtitlesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            user_agent: default_user_agent(),
            endpoint: default_opensubtitles_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation model configuration
///
/// Decoding is pinned to deterministic settings so retried batches
/// come back identical.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Top probability mass to consider (nucleus sampling)
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Top k tokens to consider
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Maximum number of tokens to generate. Burmese script is very
    /// token-heavy, so this needs to be large.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Extra attempts after the first failed batch call
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay between retry attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_key: String::new(),
            endpoint: default_gemini_endpoint(),
            temperature: 0.0,
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Job planning and persistence configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobConfig {
    /// Number of subtitle lines per translation batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Ceiling on automatically translated lines; lines beyond it
    /// stay untranslated until edited manually
    #[serde(default = "default_max_auto_translate")]
    pub max_auto_translate: usize,

    /// Database file path; defaults to the user data directory when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_auto_translate: default_max_auto_translate(),
            database_path: None,
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

fn default_user_agent() -> String {
    "myansub v0.3".to_string()
}

fn default_opensubtitles_endpoint() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    65536
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_batch_size() -> usize {
    25
}

fn default_max_auto_translate() -> usize {
    1000
}

impl Config {
    /// Load configuration from a JSON file, creating a default one if missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            let config = Config::default();
            config.save(path)?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Write the configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Override secrets from environment variables so API keys
    /// never have to live in the config file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                self.translation.api_key = key;
            }
        }
        if let Ok(key) = std::env::var("OPENSUBTITLES_API_KEY") {
            if !key.is_empty() {
                self.opensubtitles.api_key = key;
            }
        }
        if let Ok(agent) = std::env::var("OPENSUBTITLES_USER_AGENT") {
            if !agent.is_empty() {
                self.opensubtitles.user_agent = agent;
            }
        }
    }

    /// Validate the job planning bounds
    ///
    /// These are needed by every command, including the offline ones that
    /// only touch the local database.
    pub fn validate_job(&self) -> Result<()> {
        if self.job.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }

        if self.job.max_auto_translate == 0 {
            return Err(anyhow!("Auto-translate ceiling must be at least 1"));
        }

        Ok(())
    }

    /// Validate the OpenSubtitles credentials
    pub fn validate_opensubtitles(&self) -> Result<()> {
        if self.opensubtitles.api_key.is_empty() {
            return Err(anyhow!("OpenSubtitles API key is required (set OPENSUBTITLES_API_KEY or the config file)"));
        }

        Ok(())
    }

    /// Validate the translation model credentials
    pub fn validate_translation(&self) -> Result<()> {
        if self.translation.api_key.is_empty() {
            return Err(anyhow!("Translation API key is required (set GEMINI_API_KEY or the config file)"));
        }

        Ok(())
    }

    /// Validate everything a full translation run needs
    pub fn validate(&self) -> Result<()> {
        self.validate_job()?;
        self.validate_opensubtitles()?;
        self.validate_translation()?;
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            opensubtitles: OpenSubtitlesConfig::default(),
            translation: TranslationConfig::default(),
            job: JobConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
