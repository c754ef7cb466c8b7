/*!
 * Provider implementations for external model services.
 *
 * This module contains the client for the Gemini API and the trait the
 * translation gateway consumes, so tests can substitute a mock model.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for text-generation model clients
///
/// The gateway only ever needs one capability from a model: send a prompt,
/// get raw text back. No structure is guaranteed in the response; recovery
/// from malformed output is the gateway's job.
#[async_trait]
pub trait ModelClient: Send + Sync + Debug {
    /// Send a prompt to the model and return its raw text response
    ///
    /// # Arguments
    /// * `prompt` - The full prompt text
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The raw response text or an error
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub mod gemini;
