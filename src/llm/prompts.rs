//! Prompt text sent with every search.

use crate::models::Coordinate;

/// System instruction fixing the annotation syntax the extractor parses.
pub const SYSTEM_INSTRUCTION: &str = r#"You are a map search assistant. Answer the user's request using real, verifiable places.

For EVERY specific place you mention, write its name in bold and follow it immediately with its coordinates in exactly this format:

**Place Name** (lat: <latitude>, lng: <longitude>)

Rules:
- Use decimal degrees with a leading minus sign for south latitudes and west longitudes.
- Never use degree symbols, N/S/E/W suffixes, or any other coordinate format.
- Put each place on its own line, optionally followed by a short description after the coordinates.
- Only give coordinates you are confident about. If you do not know a place's location, do not annotate it.

Example:
**Central Park** (lat: 40.7829, lng: -73.9654) - a large park in Manhattan."#;

/// Sentence appended to the query when the user's location is known.
pub fn bias_sentence(location: &Coordinate) -> String {
    format!(
        "I am currently near (lat: {:.5}, lng: {:.5}); prefer places close to me when relevant.",
        location.lat(),
        location.lng()
    )
}
