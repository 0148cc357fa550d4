//! Service layer for mapsearch.
//!
//! Extraction, viewport reconciliation and the session that drives them.
//! Nothing here prints; the CLI is one consumer among possible others.

pub mod extract;
pub mod geolocation;
pub mod geolookup;
pub mod reconcile;
pub mod session;

pub use extract::{CoordinateExtractor, Extraction, UNKNOWN_LOCATION};
pub use geolocation::{resolve_location, FixedLocation, GeolocationError, Geolocator};
pub use reconcile::{
    ReconcileSettings, ViewCandidate, ViewDecision, ViewReconciler, CENTER_EPSILON_DEG,
};
pub use session::{
    QueryTicket, SearchError, SearchOutcome, SearchSession, SAVED_PLACES_SUMMARY,
    SEARCH_FAILED_MESSAGE,
};
