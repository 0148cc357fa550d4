//! Search results and their citations.

use serde::{Deserialize, Serialize};

use super::place::PlaceSet;

/// A citation backing a search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

impl GroundingSource {
    /// Build a source, rejecting an empty uri. An empty title falls back to the uri.
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Option<Self> {
        let uri = uri.into().trim().to_string();
        if uri.is_empty() {
            return None;
        }
        let title = title.into().trim().to_string();
        let title = if title.is_empty() { uri.clone() } else { title };
        Some(Self { uri, title })
    }
}

/// One query's complete output. Published atomically.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResult {
    pub summary: String,
    pub places: PlaceSet,
    pub sources: Vec<GroundingSource>,
}

impl SearchResult {
    pub fn new(summary: impl Into<String>, places: PlaceSet, sources: Vec<GroundingSource>) -> Self {
        Self {
            summary: summary.into(),
            places,
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_requires_uri() {
        assert!(GroundingSource::new("  ", "Title").is_none());
        let src = GroundingSource::new("https://example.com", "").unwrap();
        assert_eq!(src.title, "https://example.com");
    }
}
