//! Coordinate extraction from AI response text.
//!
//! Finds `(lat: <n>, lng: <n>)` annotations and turns each one, together with
//! the text leading up to it, into a [`Place`]:
//!
//! ```text
//! **Central Park** is great (lat: 40.7829, lng: -73.9654) - a big green space.
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!        name candidate               annotation
//! ```
//!
//! Labels are case-insensitive and may be spelled `lat`/`latitude` and
//! `lng`/`longitude`. A mention whose numbers do not parse, or parse to an
//! out-of-range coordinate, is dropped on its own; the rest of the text is
//! still scanned. No geocoding, no deduplication.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::models::{Coordinate, IdGenerator, InvalidCoordinate, Place};

/// Name used when nothing usable precedes an annotation.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Emphasized spans (`**bold**` or `__bold__`) inside a name candidate.
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*\n]+?)\*\*|__([^_\n]+?)__").expect("emphasis regex should compile")
});

/// Why a single mention was dropped. Never surfaced to callers.
#[derive(Debug, Clone, PartialEq)]
enum ExtractionSkip {
    /// A numeric capture did not parse as a float.
    Malformed { field: &'static str, token: String },
    /// The numbers parsed but do not form a valid coordinate.
    Invalid(InvalidCoordinate),
}

/// Extracts places from annotated text.
#[derive(Clone)]
pub struct CoordinateExtractor {
    ids: Arc<dyn IdGenerator>,
}

impl CoordinateExtractor {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Lazily scan `text`, yielding places in annotation order.
    ///
    /// Each call starts a fresh scan, so the sequence can be restarted by
    /// calling this again.
    pub fn extract<'a>(&'a self, text: &'a str) -> Extraction<'a> {
        Extraction {
            text,
            ids: self.ids.as_ref(),
            cursor: 0,
            name_floor: 0,
        }
    }

    /// Collect every place in `text`.
    pub fn extract_all(&self, text: &str) -> Vec<Place> {
        self.extract(text).collect()
    }
}

/// Raw pieces of one structurally complete annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Annotation<'a> {
    /// Byte offset of the opening parenthesis.
    start: usize,
    /// Byte offset just past the closing parenthesis.
    end: usize,
    lat: &'a str,
    lng: &'a str,
}

/// Scanner states. Every call to `next` begins in `Seeking`.
enum ScanState<'a> {
    /// Looking for the next `(`.
    Seeking,
    /// At a `(`, reading labels and numeric tokens.
    CapturingNumbers { open: usize },
    /// Annotation found; resolving the name that precedes it.
    CapturingName { annotation: Annotation<'a> },
}

/// Iterator over the places found in one text.
pub struct Extraction<'a> {
    text: &'a str,
    ids: &'a dyn IdGenerator,
    /// Where `Seeking` resumes.
    cursor: usize,
    /// Name candidates never reach back past the previous annotation.
    name_floor: usize,
}

impl<'a> Iterator for Extraction<'a> {
    type Item = Place;

    fn next(&mut self) -> Option<Place> {
        let mut state = ScanState::Seeking;
        loop {
            state = match state {
                ScanState::Seeking => match self.text[self.cursor..].find('(') {
                    Some(offset) => ScanState::CapturingNumbers {
                        open: self.cursor + offset,
                    },
                    None => {
                        self.cursor = self.text.len();
                        return None;
                    }
                },
                ScanState::CapturingNumbers { open } => match read_annotation(self.text, open) {
                    Some(annotation) => ScanState::CapturingName { annotation },
                    None => {
                        self.cursor = open + 1;
                        ScanState::Seeking
                    }
                },
                ScanState::CapturingName { annotation } => {
                    let raw = name_candidate(self.text, self.name_floor, annotation.start);
                    self.cursor = annotation.end;
                    self.name_floor = annotation.end;

                    match parse_coordinate(&annotation) {
                        Ok(coordinate) => {
                            let name = normalize_name(raw);
                            return Some(Place::new(self.ids.next_id(), name, coordinate));
                        }
                        Err(skip) => {
                            debug!(
                                "Dropping location mention at byte {}: {:?}",
                                annotation.start, skip
                            );
                            ScanState::Seeking
                        }
                    }
                }
            };
        }
    }
}

/// Read `(lat: X, lng: Y)` starting at the `(` at `open`.
///
/// Returns `None` when the structure does not match; the numeric tokens are
/// returned unparsed.
fn read_annotation(text: &str, open: usize) -> Option<Annotation<'_>> {
    let mut i = skip_whitespace(text, open + 1);
    i = match_label(text, i, &["latitude", "lat"])?;
    i = expect_byte(text, skip_whitespace(text, i), b':')?;
    let (lat, after_lat) = take_token(text, i, b',')?;

    i = skip_whitespace(text, after_lat);
    i = match_label(text, i, &["longitude", "lng"])?;
    i = expect_byte(text, skip_whitespace(text, i), b':')?;
    let (lng, end) = take_token(text, i, b')')?;

    Some(Annotation {
        start: open,
        end,
        lat,
        lng,
    })
}

fn skip_whitespace(text: &str, mut i: usize) -> usize {
    let bytes = text.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Match the first label that appears at `i` (ASCII case-insensitive).
fn match_label(text: &str, i: usize, labels: &[&str]) -> Option<usize> {
    labels.iter().find_map(|label| {
        text.get(i..i + label.len())
            .filter(|s| s.eq_ignore_ascii_case(label))
            .map(|_| i + label.len())
    })
}

fn expect_byte(text: &str, i: usize, byte: u8) -> Option<usize> {
    (text.as_bytes().get(i) == Some(&byte)).then_some(i + 1)
}

/// Take a trimmed token up to `delimiter`, returning it and the offset just
/// past the delimiter.
///
/// Parentheses, commas and newlines end the annotation structure early.
fn take_token(text: &str, start: usize, delimiter: u8) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b == delimiter {
            return Some((text[start..i].trim(), i + 1));
        }
        if matches!(b, b'(' | b')' | b',' | b'\n') {
            return None;
        }
        i += 1;
    }
    None
}

fn parse_coordinate(annotation: &Annotation<'_>) -> Result<Coordinate, ExtractionSkip> {
    let lat = parse_number("lat", annotation.lat)?;
    let lng = parse_number("lng", annotation.lng)?;
    Coordinate::new(lat, lng).map_err(ExtractionSkip::Invalid)
}

fn parse_number(field: &'static str, token: &str) -> Result<f64, ExtractionSkip> {
    token.parse::<f64>().map_err(|_| ExtractionSkip::Malformed {
        field,
        token: token.to_string(),
    })
}

/// Text between the nearest sentence boundary and the annotation.
///
/// Boundaries are `floor`, a newline, or `.`/`!`/`?` followed by whitespace.
fn name_candidate(text: &str, floor: usize, annotation_start: usize) -> &str {
    let region = &text[floor..annotation_start];
    let mut begin = 0;
    let mut chars = region.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\n' => begin = idx + 1,
            '.' | '!' | '?' => {
                if chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
                    begin = idx + 1;
                }
            }
            _ => {}
        }
    }
    &region[begin..]
}

/// Clean a raw name candidate into a display name.
///
/// The last emphasized span wins over surrounding filler words, unless a
/// later `;` clause names something else. Otherwise list markers and
/// emphasis characters are stripped, and only the text after the last
/// sentence-ending punctuation is kept.
fn normalize_name(raw: &str) -> String {
    let candidate = match EMPHASIS.captures_iter(raw).last() {
        Some(caps) => {
            let span = caps.get(0).map_or(raw.len(), |m| m.end());
            match trailing_name(&raw[span..]) {
                Some(name) => name,
                None => caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map_or(raw, |m| m.as_str()),
            }
        }
        None => raw,
    };

    let stripped: String = strip_list_marker(candidate)
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`'))
        .collect();

    let tail = match stripped.rfind(['.', '!', '?']) {
        Some(idx) => &stripped[idx + 1..],
        None => stripped.as_str(),
    };

    let name = tail
        .trim_matches(|c: char| c.is_whitespace() || is_separator(c))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        name
    }
}

/// A proper name in a later clause, such as `Bryant Park` in
/// `; instead go to Bryant Park`. Only `;` starts a clause; a comma or colon
/// after a name introduces its description.
fn trailing_name(text: &str) -> Option<&str> {
    let clause = &text[text.rfind(';')? + 1..];
    let word = clause
        .split_whitespace()
        .find(|word| word.starts_with(char::is_uppercase))?;
    let offset = word.as_ptr() as usize - clause.as_ptr() as usize;
    Some(&clause[offset..])
}

fn is_separator(c: char) -> bool {
    matches!(
        c,
        ':' | ';' | ',' | '-' | '\u{2013}' | '\u{2014}' | '(' | ')' | '"' | '\u{2022}'
    )
}

/// Strip leading bullets (`-`, `*`, `+`, `•`, `>`, `#`) and `1.`/`1)` numbering.
fn strip_list_marker(s: &str) -> &str {
    let s = s.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '*' | '+' | '\u{2022}' | '>' | '#')
    });

    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &s[digits..];
        if let Some(after) = rest.strip_prefix(['.', ')']) {
            if after.starts_with(char::is_whitespace) {
                return after.trim_start();
            }
        }
    }
    s
}
