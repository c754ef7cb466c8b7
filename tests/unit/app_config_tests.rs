/*!
 * Tests for application configuration
 */

use anyhow::Result;
use myansub::app_config::{Config, LogLevel};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_shouldHaveExpectedValues() {
    let config = Config::default();

    assert_eq!(config.job.batch_size, 25);
    assert_eq!(config.job.max_auto_translate, 1000);
    assert!(config.job.database_path.is_none());

    assert_eq!(config.translation.model, "gemini-2.5-flash");
    assert_eq!(config.translation.temperature, 0.0);
    assert_eq!(config.translation.retry_count, 2);
    assert_eq!(config.translation.retry_delay_ms, 1000);

    assert_eq!(
        config.opensubtitles.endpoint,
        "https://api.opensubtitles.com/api/v1"
    );
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test config save and load round trip
#[test]
fn test_save_and_load_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.job.batch_size = 50;
    config.translation.model = "gemini-2.5-pro".to_string();
    config.save(&config_path)?;

    let loaded = Config::load_or_create(&config_path)?;

    assert_eq!(loaded.job.batch_size, 50);
    assert_eq!(loaded.translation.model, "gemini-2.5-pro");
    Ok(())
}

/// Test that a missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = temp_dir.path().join("conf.json");

    assert!(!config_path.exists());
    let config = Config::load_or_create(&config_path)?;

    assert!(config_path.exists());
    assert_eq!(config.job.batch_size, 25);
    Ok(())
}

/// Test that partial config files pick up defaults for missing sections
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "conf.json",
        r#"{ "job": { "batch_size": 5 } }"#,
    )?;

    let config = Config::load_or_create(&config_path)?;

    assert_eq!(config.job.batch_size, 5);
    assert_eq!(config.job.max_auto_translate, 1000);
    assert_eq!(config.translation.model, "gemini-2.5-flash");
    Ok(())
}

/// Test validation of required API keys
#[test]
fn test_validate_withMissingApiKeys_shouldFail() {
    let mut config = Config::default();
    config.translation.api_key = String::new();
    config.opensubtitles.api_key = String::new();
    assert!(config.validate().is_err());

    config.translation.api_key = "gemini-key".to_string();
    assert!(config.validate().is_err());

    config.opensubtitles.api_key = "os-key".to_string();
    assert!(config.validate().is_ok());
}

/// Test that job settings validate on their own without any API keys,
/// so offline commands never demand credentials
#[test]
fn test_validate_job_withoutApiKeys_shouldPass() {
    let mut config = Config::default();
    config.translation.api_key = String::new();
    config.opensubtitles.api_key = String::new();

    assert!(config.validate_job().is_ok());
    assert!(config.validate_opensubtitles().is_err());
    assert!(config.validate_translation().is_err());
}

/// Test that each service key validates independently of the other
#[test]
fn test_validate_opensubtitles_withKeyOnly_shouldPass() {
    let mut config = Config::default();
    config.opensubtitles.api_key = "os-key".to_string();
    config.translation.api_key = String::new();

    assert!(config.validate_opensubtitles().is_ok());
    assert!(config.validate_translation().is_err());
}

/// Test validation of job planning bounds
#[test]
fn test_validate_withZeroBounds_shouldFail() {
    let mut config = Config::default();
    config.translation.api_key = "k".to_string();
    config.opensubtitles.api_key = "k".to_string();

    config.job.batch_size = 0;
    assert!(config.validate().is_err());

    config.job.batch_size = 25;
    config.job.max_auto_translate = 0;
    assert!(config.validate().is_err());
}
