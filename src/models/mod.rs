//! Data models for mapsearch.

mod coordinate;
mod place;
mod search;
mod viewport;

pub use coordinate::{Coordinate, InvalidCoordinate, SAME_LOCATION_TOLERANCE};
pub use place::{IdGenerator, Place, PlaceId, PlaceSet, SequentialIds, UuidIds};
pub use search::{GroundingSource, SearchResult};
pub use viewport::{ViewportState, ZoomRange};
