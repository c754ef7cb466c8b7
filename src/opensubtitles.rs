/*!
 * OpenSubtitles API client.
 *
 * Thin wrapper over the REST catalog: search for English subtitles by
 * title and download a selected file's raw SRT content. Failures surface
 * to the caller; no retry happens at this layer.
 */

use std::time::Duration;
use reqwest::Client;
use serde::Deserialize;
use url::Url;
use log::{debug, error};

use crate::app_config::OpenSubtitlesConfig;
use crate::errors::ProviderError;

/// OpenSubtitles API client
#[derive(Debug, Clone)]
pub struct OpenSubtitles {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// User agent string the API requires
    user_agent: String,
    /// API endpoint URL
    endpoint: String,
}

/// A single search result from the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleSearchResult {
    /// Catalog entry id
    pub id: String,
    /// Entry attributes
    pub attributes: SubtitleAttributes,
}

/// Attributes of a catalog entry
#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleAttributes {
    /// Release name, e.g. "Movie.2023.1080p.BluRay"
    #[serde(default)]
    pub release: String,

    /// Subtitle language code
    #[serde(default)]
    pub language: Option<String>,

    /// Details about the movie this subtitle belongs to
    #[serde(default)]
    pub feature_details: Option<FeatureDetails>,

    /// Downloadable files for this entry
    #[serde(default)]
    pub files: Vec<SubtitleFile>,
}

/// Movie metadata attached to a search result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureDetails {
    /// Movie title as known to the catalog
    #[serde(default)]
    pub title: Option<String>,

    /// IMDb identifier
    #[serde(default)]
    pub imdb_id: Option<i64>,
}

/// A downloadable subtitle file descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleFile {
    /// File id used for download requests
    pub file_id: i64,

    /// Display name of the file
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Response wrapper for the search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SubtitleSearchResult>,
}

/// Response for the download endpoint; `link` points at the actual file
#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
}

impl OpenSubtitles {
    /// Create a new client from the catalog configuration
    pub fn new(config: &OpenSubtitlesConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone(),
            user_agent: config.user_agent.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Search the catalog for English subtitles matching a query
    pub async fn search(&self, query: &str) -> Result<Vec<SubtitleSearchResult>, ProviderError> {
        let base = format!("{}/subtitles", self.endpoint.trim_end_matches('/'));
        let url = Url::parse_with_params(&base, &[("query", query), ("languages", "en")])
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid search URL: {}", e)))?;

        debug!("Searching subtitles for '{}'", query);

        let response = self.client.get(url)
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to reach OpenSubtitles: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenSubtitles search error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let search_response = response.json::<SearchResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse search response: {}", e)))?;

        Ok(search_response.data)
    }

    /// Download a subtitle file's raw SRT content by file id
    ///
    /// Two round trips: the download endpoint hands back a temporary link,
    /// then the link is fetched for the file body.
    pub async fn download(&self, file_id: i64) -> Result<String, ProviderError> {
        let url = format!("{}/download", self.endpoint.trim_end_matches('/'));

        let response = self.client.post(&url)
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to reach OpenSubtitles: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenSubtitles download error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let download = response.json::<DownloadResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse download response: {}", e)))?;

        debug!("Fetching subtitle content for file {}", file_id);

        let srt_response = self.client.get(&download.link)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to fetch subtitle file: {}", e)))?;

        srt_response.text().await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read subtitle file body: {}", e)))
    }
}
