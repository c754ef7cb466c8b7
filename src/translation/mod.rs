/*!
 * Translation gateway for batch subtitle translation.
 *
 * This module wraps the external model call with retry and
 * malformed-output recovery:
 *
 * - `gateway`: the batch gateway, prompt construction, and payload repair
 */

// Re-export main types for easier usage
pub use self::gateway::{BatchTranslator, TranslationGateway};

// Submodules
pub mod gateway;
