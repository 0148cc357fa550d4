//! The AI transport seam used by the search session.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Coordinate, GroundingSource};

/// Raw response of one grounded query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResponse {
    /// Free text, expected to carry `(lat: X, lng: Y)` annotations.
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

/// Errors that can occur while querying the AI backend.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Failed to reach the service
    #[error("Connection error: {0}")]
    Connection(String),

    /// Missing or rejected credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limited after all retries
    #[error("Quota exceeded: {0}")]
    Quota(String),

    /// Service returned an error
    #[error("API error: {0}")]
    Api(String),

    /// Response could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Text in, free text plus citations out.
///
/// Implementations own any timeout; callers never cancel a query, they
/// only ignore its result when it has been superseded.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn query(
        &self,
        text: &str,
        bias: Option<Coordinate>,
    ) -> Result<TransportResponse, TransportError>;
}
