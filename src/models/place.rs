//! Place records and their identity.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

use super::coordinate::{Coordinate, SAME_LOCATION_TOLERANCE};

/// Opaque identifier assigned when a place is created.
///
/// Stable for the lifetime of the in-memory session. Not a dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(String);

impl PlaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh place identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> PlaceId;
}

/// Monotonic `place-N` identifiers. Deterministic, used by tests and the CLI.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> PlaceId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        PlaceId(format!("place-{}", n))
    }
}

/// Random v4 UUID identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> PlaceId {
        PlaceId(uuid::Uuid::new_v4().to_string())
    }
}

/// A named location shown as a map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Place {
    pub fn new(id: PlaceId, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id,
            name: name.into(),
            coordinate,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether both records name the same real-world location.
    ///
    /// Exact name match plus coordinates within [`SAME_LOCATION_TOLERANCE`].
    /// Ids are ignored.
    pub fn same_location(&self, other: &Place) -> bool {
        self.name == other.name
            && self
                .coordinate
                .approx_eq(&other.coordinate, SAME_LOCATION_TOLERANCE)
    }
}

/// An immutable, shared sequence of places with object identity.
///
/// Clones share the same allocation, so [`PlaceSet::same_set`] tells a
/// re-render of an existing result apart from a freshly published one even
/// when the contents are equal.
#[derive(Debug, Clone)]
pub struct PlaceSet(Arc<[Place]>);

impl PlaceSet {
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Identity comparison, not content comparison.
    pub fn same_set(&self, other: &PlaceSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn find(&self, id: &PlaceId) -> Option<&Place> {
        self.0.iter().find(|p| &p.id == id)
    }
}

impl Default for PlaceSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Place>> for PlaceSet {
    fn from(places: Vec<Place>) -> Self {
        Self(Arc::from(places))
    }
}

impl FromIterator<Place> for PlaceSet {
    fn from_iter<I: IntoIterator<Item = Place>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl Deref for PlaceSet {
    type Target = [Place];

    fn deref(&self) -> &[Place] {
        &self.0
    }
}

impl Serialize for PlaceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, name: &str, lat: f64, lng: f64) -> Place {
        Place::new(PlaceId::new(id), name, Coordinate::new(lat, lng).unwrap())
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id().as_str(), "place-1");
        assert_eq!(ids.next_id().as_str(), "place-2");
    }

    #[test]
    fn test_uuid_ids_unique() {
        let ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn test_same_location_ignores_id() {
        let a = place("a", "Central Park", 40.7829, -73.9654);
        let b = place("b", "Central Park", 40.78291, -73.96541);
        let c = place("c", "Central park", 40.7829, -73.9654);
        assert!(a.same_location(&b));
        assert!(!a.same_location(&c));
    }

    #[test]
    fn test_place_set_identity() {
        let set: PlaceSet = vec![place("a", "A", 1.0, 1.0)].into();
        let clone = set.clone();
        let equal: PlaceSet = vec![place("a", "A", 1.0, 1.0)].into();

        assert!(set.same_set(&clone));
        assert!(!set.same_set(&equal));
        assert_eq!(&set[..], &equal[..]);
    }

    #[test]
    fn test_place_set_find() {
        let set: PlaceSet = vec![place("a", "A", 1.0, 1.0), place("b", "B", 2.0, 2.0)].into();
        assert_eq!(set.find(&PlaceId::new("b")).unwrap().name, "B");
        assert!(set.find(&PlaceId::new("z")).is_none());
    }
}
