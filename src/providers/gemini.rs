use std::time::Duration;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::error;
use async_trait::async_trait;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use super::ModelClient;

/// Gemini client for interacting with the Google Generative Language API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// Model identifier, e.g. "gemini-2.5-flash"
    model: String,
    /// Generation configuration sent with every request
    generation_config: GenerationConfig,
}

/// Gemini generateContent request
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// The conversation contents
    contents: Vec<GeminiContent>,

    /// Decoding parameters
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

/// A single content block in a Gemini request or response
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiContent {
    /// The parts making up this content
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// One part of a content block
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text payload
    #[serde(default)]
    pub text: String,
}

/// Decoding parameters for generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,

    /// Top probability mass to consider (nucleus sampling)
    #[serde(rename = "topP")]
    pub top_p: f32,

    /// Top k tokens to consider
    #[serde(rename = "topK")]
    pub top_k: u32,

    /// Maximum number of tokens to generate
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

/// Gemini generateContent response
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Candidate completions; the first one carries the answer
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// A single candidate completion
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// The generated content
    #[serde(default)]
    pub content: GeminiContent,
}

impl Gemini {
    /// Create a new Gemini client from the translation configuration
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
            },
        }
    }

    /// Complete a generateContent request
    pub async fn complete(&self, prompt: &str) -> Result<GeminiResponse, ProviderError> {
        let base = if self.endpoint.is_empty() {
            "https://generativelanguage.googleapis.com"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        let api_url = format!("{}/v1beta/models/{}:generateContent", base, self.model);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            generation_config: self.generation_config.clone(),
        };

        let response = self.client.post(&api_url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to Gemini API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ProviderError::AuthenticationError(error_text));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let gemini_response = response.json::<GeminiResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini API response: {}", e)))?;

        Ok(gemini_response)
    }

    /// Extract the concatenated text from a Gemini response
    pub fn extract_text_from_response(response: &GeminiResponse) -> String {
        response.candidates.first()
            .map(|candidate| {
                candidate.content.parts.iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for Gemini {
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        let response = self.complete(prompt).await?;
        Ok(Self::extract_text_from_response(&response))
    }
}
