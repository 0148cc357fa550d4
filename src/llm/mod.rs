//! Generative AI transport for grounded place search.
//!
//! Sends the user's query to Gemini with a grounding tool enabled and a system
//! instruction asking for inline `(lat: X, lng: Y)` annotations, which the
//! extractor in `services::extract` consumes.

mod client;
mod config;
mod prompts;
mod transport;

pub use client::GeminiClient;
pub use config::{GroundingTool, LlmAppConfig, LlmConfig, LlmDeviceConfig};
pub use prompts::{bias_sentence, SYSTEM_INSTRUCTION};
pub use transport::{SearchTransport, TransportError, TransportResponse};
