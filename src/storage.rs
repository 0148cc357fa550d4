//! Saved places, kept as a JSON blob on disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Coordinate, Place, PlaceId, PlaceSet, SAME_LOCATION_TOLERANCE};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt saved places file: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A place as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlace {
    pub id: PlaceId,
    pub name: String,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl SavedPlace {
    pub fn from_place(place: &Place, saved_at: DateTime<Utc>) -> Self {
        Self {
            id: place.id.clone(),
            name: place.name.clone(),
            coordinate: place.coordinate,
            description: place.description.clone(),
            saved_at,
        }
    }

    pub fn to_place(&self) -> Place {
        Place {
            id: self.id.clone(),
            name: self.name.clone(),
            coordinate: self.coordinate,
            description: self.description.clone(),
        }
    }

    fn same_location(&self, place: &Place) -> bool {
        self.name == place.name
            && self
                .coordinate
                .approx_eq(&place.coordinate, SAME_LOCATION_TOLERANCE)
    }
}

/// File-backed store of saved places.
///
/// Every operation re-reads the file; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct SavedPlacesStore {
    path: PathBuf,
}

impl SavedPlacesStore {
    /// Open a store at `path`. The file need not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved places, oldest first. A missing file reads as empty.
    pub async fn list(&self) -> Result<Vec<SavedPlace>, PersistenceError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saved places as a fresh place set.
    pub async fn places(&self) -> Result<PlaceSet, PersistenceError> {
        Ok(self.list().await?.iter().map(SavedPlace::to_place).collect())
    }

    /// Save places not already stored. Returns how many were added.
    ///
    /// A place is a duplicate when an existing record, or an earlier place in
    /// the same batch, has the same name and a coordinate within tolerance.
    pub async fn save_all(&self, places: &[Place]) -> Result<usize, PersistenceError> {
        let mut records = self.list().await?;
        let before = records.len();
        let now = Utc::now();

        for place in places {
            if records.iter().any(|r| r.same_location(place)) {
                tracing::debug!("Skipping duplicate saved place: {}", place.name);
                continue;
            }
            records.push(SavedPlace::from_place(place, now));
        }

        let added = records.len() - before;
        if added > 0 {
            self.write(&records).await?;
        }
        tracing::info!("Saved {} new place(s) to {}", added, self.path.display());
        Ok(added)
    }

    /// Remove by id, falling back to an exact name match when no id matches.
    pub async fn remove(&self, id: &PlaceId, name: &str) -> Result<bool, PersistenceError> {
        let mut records = self.list().await?;
        let before = records.len();

        if records.iter().any(|r| &r.id == id) {
            records.retain(|r| &r.id != id);
        } else {
            records.retain(|r| r.name != name);
        }

        if records.len() == before {
            return Ok(false);
        }
        self.write(&records).await?;
        Ok(true)
    }

    async fn write(&self, records: &[SavedPlace]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn place(id: &str, name: &str, lat: f64, lng: f64) -> Place {
        Place::new(PlaceId::new(id), name, Coordinate::new(lat, lng).unwrap())
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = SavedPlacesStore::open(dir.path().join("saved_places.json"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_dedups() {
        let dir = tempdir().unwrap();
        let store = SavedPlacesStore::open(dir.path().join("nested").join("saved_places.json"));

        let added = store
            .save_all(&[
                place("a", "Central Park", 40.7829, -73.9654),
                place("b", "Central Park", 40.78291, -73.96541),
                place("c", "Bryant Park", 40.7536, -73.9832),
            ])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let added = store
            .save_all(&[
                place("d", "Central Park", 40.7829, -73.9654),
                place("e", "Central Park", 40.80, -73.9654),
            ])
            .await
            .unwrap();
        assert_eq!(added, 1);

        let names: Vec<_> = store.list().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(
            names,
            vec![PlaceId::new("a"), PlaceId::new("c"), PlaceId::new("e")]
        );
    }

    #[tokio::test]
    async fn test_remove_by_id_then_name() {
        let dir = tempdir().unwrap();
        let store = SavedPlacesStore::open(dir.path().join("saved_places.json"));
        store
            .save_all(&[
                place("a", "Central Park", 40.7829, -73.9654),
                place("b", "Bryant Park", 40.7536, -73.9832),
            ])
            .await
            .unwrap();

        assert!(store.remove(&PlaceId::new("a"), "ignored").await.unwrap());
        assert!(store.remove(&PlaceId::new("stale"), "Bryant Park").await.unwrap());
        assert!(!store.remove(&PlaceId::new("x"), "Nowhere").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved_places.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SavedPlacesStore::open(&path);
        assert!(matches!(
            store.list().await,
            Err(PersistenceError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_records_round_trip_timestamp() {
        let dir = tempdir().unwrap();
        let store = SavedPlacesStore::open(dir.path().join("saved_places.json"));
        store
            .save_all(&[place("a", "Pier 39", 37.8087, -122.4098).with_description("sea lions")])
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("saved_at"));
        let places = store.places().await.unwrap();
        assert_eq!(places[0].description.as_deref(), Some("sea lions"));
    }
}
