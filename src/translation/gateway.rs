/*!
 * Batch translation gateway.
 *
 * Wraps the model invocation with the defenses an unreliable structured
 * output needs: strict-JSON prompting, code-fence stripping, truncated
 * payload repair, bounded retries, and padding so the caller always gets
 * back exactly as many strings as it sent.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::providers::ModelClient;

/// Contract the job controller depends on: an ordered list of source
/// strings in, an equally long ordered list of translations out.
#[async_trait]
pub trait BatchTranslator: Send + Sync {
    /// Translate a batch of source strings, best-effort
    ///
    /// Implementations must return a list of exactly `texts.len()` entries
    /// when they return `Ok`; untranslatable entries come back empty.
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>>;
}

/// The structured payload the model is instructed to return
#[derive(Debug, Deserialize)]
struct TranslationPayload {
    translations: Vec<String>,
}

/// Gateway between the job controller and the translation model
pub struct TranslationGateway {
    /// Model client used for invocations
    client: Arc<dyn ModelClient>,

    /// Extra attempts after the first failure
    retry_count: u32,

    /// Delay between attempts
    retry_delay: Duration,
}

impl TranslationGateway {
    /// Create a new gateway around a model client
    pub fn new(client: Arc<dyn ModelClient>, config: &TranslationConfig) -> Self {
        Self {
            client,
            retry_count: config.retry_count,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Build the translation prompt for a batch of source strings
    fn build_prompt(texts: &[String]) -> String {
        let input = serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string());

        format!(
            "You are a professional movie subtitle translator.\n\
             Translate each English line below into natural, conversational Burmese.\n\
             Keep translations concise (subtitle-appropriate length).\n\
             \n\
             CRITICAL: Return ONLY valid JSON. No markdown, no explanation.\n\
             \n\
             Input: {}\n\
             \n\
             Return exactly this format:\n\
             {{\"translations\":[\"line1_in_burmese\",\"line2_in_burmese\"]}}",
            input
        )
    }

    /// Strip markdown code fences the model sometimes wraps around the payload
    fn strip_fences(raw: &str) -> String {
        raw.replace("```json", "").replace("```", "").trim().to_string()
    }

    /// Repair a payload that was cut off mid-string by the output limit
    ///
    /// Truncates back to the last complete quoted string and closes the
    /// array and object, recovering a valid prefix instead of losing the
    /// whole batch.
    fn repair_truncation(text: &str) -> String {
        if text.ends_with('}') {
            return text.to_string();
        }

        if let Some(last_quote) = text.rfind('"') {
            if last_quote > 0 {
                warn!("Repairing truncated translation payload");
                return format!("{}]}}", &text[..=last_quote]);
            }
        }

        text.to_string()
    }

    /// Parse a raw model response into a list of translations
    fn parse_response(raw: &str) -> Result<Vec<String>, ProviderError> {
        let text = Self::strip_fences(raw);
        let text = Self::repair_truncation(&text);

        let payload: TranslationPayload = serde_json::from_str(&text).map_err(|e| {
            ProviderError::ParseError(format!(
                "Invalid translation payload: {} (starts with: {})",
                e,
                &text.chars().take(80).collect::<String>()
            ))
        })?;

        Ok(payload.translations)
    }

    /// Force a translation list to exactly the requested length
    fn pad_to_length(mut translations: Vec<String>, expected: usize) -> Vec<String> {
        if translations.len() > expected {
            warn!(
                "Model returned {} translations for {} inputs, dropping extras",
                translations.len(),
                expected
            );
            translations.truncate(expected);
        }
        while translations.len() < expected {
            translations.push(String::new());
        }
        translations
    }
}

#[async_trait]
impl BatchTranslator for TranslationGateway {
    /// Translate a batch of source strings, best-effort
    ///
    /// Retries the whole batch on any invocation or parse failure. When
    /// every attempt fails the batch degrades to all-empty strings; from
    /// the caller's perspective translation never fails, individual lines
    /// just come back empty.
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = Self::build_prompt(texts);

        for attempt in 0..=self.retry_count {
            debug!(
                "Sending batch of {} lines to the model (attempt {})",
                texts.len(),
                attempt + 1
            );

            let outcome = match self.client.invoke(&prompt).await {
                Ok(raw) => Self::parse_response(&raw),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(translations) => {
                    debug!(
                        "Translated {}/{} lines in this batch",
                        translations.len().min(texts.len()),
                        texts.len()
                    );
                    return Ok(Self::pad_to_length(translations, texts.len()));
                }
                Err(e) => {
                    warn!("Translation attempt {} failed: {}", attempt + 1, e);
                    if attempt < self.retry_count {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        warn!("All translation attempts failed, returning empty translations for this batch");
        Ok(vec![String::new(); texts.len()])
    }
}
