//! Search LLM client configuration.
//!
//! Split into two tiers:
//! - `LlmAppConfig`: From the config file (model, generation params, grounding)
//! - `LlmDeviceConfig`: From env vars, device-specific (api_key, overrides)
//!
//! Env vars: GEMINI_API_KEY (or MAPSEARCH_API_KEY), MAPSEARCH_MODEL,
//! MAPSEARCH_ENDPOINT, MAPSEARCH_GROUNDING

use serde::{Deserialize, Serialize};

use super::prompts::SYSTEM_INSTRUCTION;

/// Grounding tool enabled on each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroundingTool {
    /// Google Maps grounding (place-aware, default)
    #[default]
    GoogleMaps,
    /// Google Search grounding
    GoogleSearch,
}

impl GroundingTool {
    /// Parse a tool name as written in the environment.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "google_maps" | "maps" => Some(Self::GoogleMaps),
            "google_search" | "search" => Some(Self::GoogleSearch),
            _ => None,
        }
    }
}

/// Application-level LLM config (config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmAppConfig {
    /// Model used for search
    #[serde(default = "default_model")]
    pub model: String,
    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens in response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// HTTP timeout for one request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries on HTTP 429 before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub grounding: GroundingTool,
    /// Custom system instruction (must keep the `(lat: X, lng: Y)` format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

/// Device-level LLM config (env vars).
#[derive(Debug, Clone, PartialEq)]
pub struct LlmDeviceConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub grounding: Option<GroundingTool>,
}

/// Combined LLM configuration (runtime).
///
/// Serde: only the app config is (de)serialized. Device config is populated
/// from environment variables during Default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(flatten)]
    pub app: LlmAppConfig,
    #[serde(skip)]
    pub device: LlmDeviceConfig,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

impl Default for LlmAppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            grounding: GroundingTool::default(),
            system_instruction: None,
        }
    }
}

impl LlmAppConfig {
    /// Get the system instruction, using custom or default.
    pub fn get_system_instruction(&self) -> &str {
        self.system_instruction
            .as_deref()
            .unwrap_or(SYSTEM_INSTRUCTION)
    }
}

impl Default for LlmDeviceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl LlmDeviceConfig {
    /// Create device config from environment variables.
    ///
    /// - GEMINI_API_KEY / MAPSEARCH_API_KEY: API key (MAPSEARCH_ wins)
    /// - MAPSEARCH_MODEL: model ID
    /// - MAPSEARCH_ENDPOINT: API base URL
    /// - MAPSEARCH_GROUNDING: `google_maps` or `google_search`
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let grounding = non_empty("MAPSEARCH_GROUNDING").and_then(|value| {
            let tool = GroundingTool::parse(&value);
            if tool.is_none() {
                tracing::warn!("Ignoring unknown MAPSEARCH_GROUNDING value: {}", value);
            }
            tool
        });
        Self {
            api_key: non_empty("MAPSEARCH_API_KEY").or_else(|| non_empty("GEMINI_API_KEY")),
            model: non_empty("MAPSEARCH_MODEL"),
            endpoint: non_empty("MAPSEARCH_ENDPOINT"),
            grounding,
        }
    }

    /// Device config with nothing set (tests, offline commands).
    pub fn empty() -> Self {
        Self {
            api_key: None,
            model: None,
            endpoint: None,
            grounding: None,
        }
    }
}

impl LlmConfig {
    pub fn new(app: LlmAppConfig, device: LlmDeviceConfig) -> Self {
        Self { app, device }
    }

    pub fn model(&self) -> &str {
        self.device.model.as_deref().unwrap_or(&self.app.model)
    }

    pub fn endpoint(&self) -> &str {
        self.device
            .endpoint
            .as_deref()
            .unwrap_or(&self.app.endpoint)
            .trim_end_matches('/')
    }

    pub fn grounding(&self) -> GroundingTool {
        self.device.grounding.unwrap_or(self.app.grounding)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.device.api_key.as_deref()
    }

    pub fn system_instruction(&self) -> &str {
        self.app.get_system_instruction()
    }

    /// Hint shown when the transport cannot be used.
    pub fn availability_hint(&self) -> String {
        if self.api_key().is_none() {
            "GEMINI_API_KEY not set. Get an API key from https://ai.google.dev/".to_string()
        } else {
            format!("Gemini API not available at {}", self.endpoint())
        }
    }
}
