//! Gemini client for grounded place search.
//!
//! Uses the `generateContent` endpoint with a Google Maps or Google Search
//! grounding tool. Requires GEMINI_API_KEY.
//!
//! Rate limiting:
//! - Retries on 429 with exponential backoff, up to `max_retries`
//! - Respects Retry-After header from API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::{GroundingTool, LlmConfig};
use super::prompts::bias_sentence;
use super::transport::{SearchTransport, TransportError, TransportResponse};
use crate::models::{Coordinate, GroundingSource};

/// Base delay for 429 backoff.
const BACKOFF_BASE_MS: u64 = 1000;

/// Gemini search transport.
pub struct GeminiClient {
    config: LlmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<GeminiToolConfig>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct EmptyObject {}

#[derive(Debug, Serialize)]
enum GeminiTool {
    #[serde(rename = "google_maps")]
    GoogleMaps(EmptyObject),
    #[serde(rename = "google_search")]
    GoogleSearch(EmptyObject),
}

#[derive(Debug, Serialize)]
struct GeminiToolConfig {
    retrieval_config: GeminiRetrievalConfig,
}

#[derive(Debug, Serialize)]
struct GeminiRetrievalConfig {
    lat_lng: GeminiLatLng,
}

#[derive(Debug, Serialize)]
struct GeminiLatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<ChunkSource>,
    maps: Option<ChunkSource>,
}

#[derive(Debug, Deserialize)]
struct ChunkSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.app.timeout_secs))
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Whether a query can be attempted at all.
    pub fn is_available(&self) -> bool {
        self.config.api_key().is_some()
    }

    fn build_request(&self, text: &str, bias: Option<Coordinate>) -> GeminiRequest {
        let prompt = match bias {
            Some(location) => format!("{}\n\n{}", text.trim(), bias_sentence(&location)),
            None => text.trim().to_string(),
        };

        let tool = match self.config.grounding() {
            GroundingTool::GoogleMaps => GeminiTool::GoogleMaps(EmptyObject {}),
            GroundingTool::GoogleSearch => GeminiTool::GoogleSearch(EmptyObject {}),
        };

        GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: self.config.system_instruction().to_string(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: prompt }],
            }],
            tools: vec![tool],
            tool_config: bias.map(|location| GeminiToolConfig {
                retrieval_config: GeminiRetrievalConfig {
                    lat_lng: GeminiLatLng {
                        latitude: location.lat(),
                        longitude: location.lng(),
                    },
                },
            }),
            generation_config: GeminiGenerationConfig {
                temperature: self.config.app.temperature,
                max_output_tokens: self.config.app.max_output_tokens,
            },
        }
    }

    /// POST the request, retrying on 429.
    async fn call_gemini(&self, request: &GeminiRequest) -> Result<GeminiResponse, TransportError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| TransportError::Auth(self.config.availability_hint()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint(),
            self.config.model()
        );

        let mut attempt = 0;
        loop {
            let resp = self
                .client
                .post(&url)
                .query(&[("key", api_key)])
                .json(request)
                .send()
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;

            let status = resp.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.config.app.max_retries {
                    return Err(TransportError::Quota(format!(
                        "rate limited after {} attempts",
                        attempt + 1
                    )));
                }
                let retry_after = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok());
                let wait = parse_retry_after(retry_after)
                    .unwrap_or_else(|| backoff_delay(attempt, BACKOFF_BASE_MS));

                warn!(
                    "Gemini rate limited (attempt {}), waiting {:?}",
                    attempt + 1,
                    wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                let body = resp.text().await.unwrap_or_default();
                return Err(TransportError::Auth(format!("HTTP {}: {}", status, body)));
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(TransportError::Api(format!("HTTP {}: {}", status, body)));
            }

            return resp
                .json()
                .await
                .map_err(|e| TransportError::Parse(e.to_string()));
        }
    }
}

#[async_trait]
impl SearchTransport for GeminiClient {
    async fn query(
        &self,
        text: &str,
        bias: Option<Coordinate>,
    ) -> Result<TransportResponse, TransportError> {
        let request = self.build_request(text, bias);
        debug!("Querying {} ({:?} grounding)", self.config.model(), self.config.grounding());

        let response = self.call_gemini(&request).await?;
        let parsed = parse_response(response)?;

        info!(
            "Gemini returned {} chars with {} sources",
            parsed.text.len(),
            parsed.sources.len()
        );
        Ok(parsed)
    }
}

/// Pull text and citations out of the first candidate.
fn parse_response(response: GeminiResponse) -> Result<TransportResponse, TransportError> {
    if let Some(error) = response.error {
        return Err(TransportError::Api(error.message));
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| TransportError::Parse("response has no candidates".to_string()))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let sources = candidate
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web.or(chunk.maps))
                .filter_map(|src| {
                    GroundingSource::new(src.uri.unwrap_or_default(), src.title.unwrap_or_default())
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(TransportResponse { text, sources })
}

/// Parse a Retry-After header value in seconds (capped at 60s).
fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(60)))
}

/// Calculate exponential backoff delay for a given attempt.
fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(60_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmAppConfig, LlmDeviceConfig};

    fn client(grounding: GroundingTool) -> GeminiClient {
        let app = LlmAppConfig {
            grounding,
            ..LlmAppConfig::default()
        };
        GeminiClient::new(LlmConfig::new(app, LlmDeviceConfig::empty())).unwrap()
    }

    #[test]
    fn test_request_shape_with_bias() {
        let c = client(GroundingTool::GoogleMaps);
        let here = Coordinate::new(40.7128, -74.006).unwrap();
        let json = serde_json::to_value(c.build_request("coffee nearby", Some(here))).unwrap();

        assert!(json["tools"][0].get("google_maps").is_some());
        assert_eq!(json["tool_config"]["retrieval_config"]["lat_lng"]["latitude"], 40.7128);
        assert_eq!(json["contents"][0]["role"], "user");
        let prompt = json["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.starts_with("coffee nearby"));
        assert!(prompt.contains("lat: 40.71280"));
        assert!(json["system_instruction"].get("role").is_none());
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_request_shape_without_bias() {
        let c = client(GroundingTool::GoogleSearch);
        let json = serde_json::to_value(c.build_request("  museums in Paris ", None)).unwrap();
        assert!(json["tools"][0].get("google_search").is_some());
        assert!(json.get("tool_config").is_none());
        assert_eq!(json["contents"][0]["parts"][0]["text"], "museums in Paris");
    }

    #[test]
    fn test_env_grounding_overrides_file() {
        let device = LlmDeviceConfig {
            grounding: Some(GroundingTool::GoogleSearch),
            ..LlmDeviceConfig::empty()
        };
        let c = GeminiClient::new(LlmConfig::new(LlmAppConfig::default(), device)).unwrap();
        let json = serde_json::to_value(c.build_request("parks", None)).unwrap();
        assert!(json["tools"][0].get("google_search").is_some());
    }

    #[test]
    fn test_parse_response_text_and_sources() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [
                    {"text": "**Louvre** (lat: 48.8606, lng: 2.3376)\n"},
                    {"text": "**Orsay** (lat: 48.86, lng: 2.3266)"}
                ]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://louvre.fr", "title": "Louvre"}},
                    {"maps": {"uri": "https://maps.google.com/?cid=1", "title": ""}},
                    {"web": {"uri": "", "title": "empty"}}
                ]}
            }]
        }"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        let parsed = parse_response(response).unwrap();

        assert!(parsed.text.contains("**Orsay**"));
        assert_eq!(parsed.sources.len(), 2);
        assert_eq!(parsed.sources[1].title, "https://maps.google.com/?cid=1");
    }

    #[test]
    fn test_parse_response_errors() {
        let response: GeminiResponse =
            serde_json::from_str(r#"{"error": {"message": "API key not valid"}}"#).unwrap();
        assert!(matches!(parse_response(response), Err(TransportError::Api(_))));

        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(parse_response(response), Err(TransportError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_auth_error() {
        let c = client(GroundingTool::GoogleMaps);
        assert!(!c.is_available());
        let err = c.query("anything", None).await.unwrap_err();
        assert!(matches!(err, TransportError::Auth(_)));
    }

    #[test]
    fn test_backoff() {
        assert_eq!(backoff_delay(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2, 1000), Duration::from_millis(4000));
        assert_eq!(backoff_delay(10, 1000), Duration::from_millis(60_000));
        assert_eq!(parse_retry_after(Some("5")), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(Some("600")), Some(Duration::from_secs(60)));
        assert_eq!(parse_retry_after(Some("soon")), None);
    }
}
