//! Search session orchestration.
//!
//! Owns the published [`SearchResult`] and the live [`ViewportState`] and is
//! the only thing that mutates them. One query lifecycle:
//!
//! 1. [`SearchSession::begin_query`] snapshots the viewport, drops any saved
//!    places backup, marks the session busy and bumps the generation.
//! 2. The caller awaits the transport.
//! 3. [`SearchSession::complete_query`] discards the response if a newer
//!    query has begun since, otherwise publishes it and reconciles the map.
//!
//! [`SearchSession::submit_query`] runs all three in one call. Callers that
//! need to accept a new query while one is pending use the split form.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::extract::CoordinateExtractor;
use super::geolocation::{GeolocationError, Geolocator};
use super::reconcile::{ReconcileSettings, ViewCandidate, ViewDecision, ViewReconciler};
use crate::config::MapConfig;
use crate::llm::{SearchTransport, TransportError, TransportResponse};
use crate::models::{Coordinate, PlaceId, PlaceSet, SearchResult, UuidIds, ViewportState};
use crate::storage::{PersistenceError, SavedPlacesStore};

/// Shown to the user whenever a search cannot be completed.
pub const SEARCH_FAILED_MESSAGE: &str =
    "Sorry, I couldn't complete that search. Please try again.";

/// Summary published while browsing saved places.
pub const SAVED_PLACES_SUMMARY: &str = "Saved places";

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search failed: {0}")]
    Transport(#[from] TransportError),

    /// A newer query began before this one completed.
    #[error("Query {generation} superseded by query {latest}")]
    Superseded { generation: u64, latest: u64 },
}

impl SearchError {
    /// Message for the user, if this error should be shown at all.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            SearchError::Transport(_) => Some(SEARCH_FAILED_MESSAGE),
            SearchError::Superseded { .. } => None,
        }
    }
}

/// A query that has begun and awaits its transport response.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTicket {
    pub generation: u64,
    pub text: String,
    pub bias: Option<Coordinate>,
}

/// What a completed query published.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub decision: ViewDecision,
    pub viewport: ViewportState,
}

/// State replaced while browsing saved places.
#[derive(Debug, Clone)]
struct SavedBrowseBackup {
    result: SearchResult,
    viewport: ViewportState,
}

pub struct SearchSession {
    transport: Arc<dyn SearchTransport>,
    extractor: CoordinateExtractor,
    reconciler: ViewReconciler,
    focus_zoom: u8,
    result: SearchResult,
    viewport: ViewportState,
    previous_viewport: Option<ViewportState>,
    saved_backup: Option<SavedBrowseBackup>,
    user_location: Option<Coordinate>,
    generation: u64,
    busy: bool,
}

impl SearchSession {
    /// A session starting at the configured initial view, with UUID place ids.
    pub fn new(transport: Arc<dyn SearchTransport>, map: &MapConfig) -> Self {
        Self {
            transport,
            extractor: CoordinateExtractor::new(Arc::new(UuidIds)),
            reconciler: ViewReconciler::new(ReconcileSettings::from(map)),
            focus_zoom: map.focus_zoom,
            result: SearchResult::default(),
            viewport: map.initial_viewport(),
            previous_viewport: None,
            saved_backup: None,
            user_location: None,
            generation: 0,
            busy: false,
        }
    }

    pub fn with_extractor(mut self, extractor: CoordinateExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    pub fn previous_viewport(&self) -> Option<ViewportState> {
        self.previous_viewport
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_browsing_saved(&self) -> bool {
        self.saved_backup.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user_location(&self) -> Option<Coordinate> {
        self.user_location
    }

    pub fn set_user_location(&mut self, location: Option<Coordinate>) {
        self.user_location = location;
    }

    pub fn transport(&self) -> Arc<dyn SearchTransport> {
        Arc::clone(&self.transport)
    }

    /// Start a query. Supersedes any query still pending.
    pub fn begin_query(&mut self, text: &str, bias: Option<Coordinate>) -> QueryTicket {
        self.previous_viewport = Some(self.viewport);
        self.saved_backup = None;
        self.busy = true;
        self.generation += 1;
        debug!("Query {} started: {}", self.generation, text);
        QueryTicket {
            generation: self.generation,
            text: text.to_string(),
            bias,
        }
    }

    /// Finish a query with its transport response.
    ///
    /// Stale tickets change nothing. A transport failure on the current
    /// ticket clears the busy flag and leaves result and viewport untouched.
    pub fn complete_query(
        &mut self,
        ticket: QueryTicket,
        response: Result<TransportResponse, TransportError>,
    ) -> Result<SearchOutcome, SearchError> {
        if ticket.generation != self.generation {
            info!(
                "Discarding response for query {} (latest is {})",
                ticket.generation, self.generation
            );
            return Err(SearchError::Superseded {
                generation: ticket.generation,
                latest: self.generation,
            });
        }
        self.busy = false;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Query {} failed: {}", ticket.generation, e);
                return Err(e.into());
            }
        };

        let places: PlaceSet = self.extractor.extract(&response.text).collect();
        debug!(
            "Query {} returned {} places and {} sources",
            ticket.generation,
            places.len(),
            response.sources.len()
        );
        self.result = SearchResult::new(response.text, places, response.sources);
        self.saved_backup = None;

        let candidate = self
            .result
            .places
            .first()
            .map(|p| ViewCandidate::at(p.coordinate, self.viewport.zoom as i32));
        let decision = self.apply(candidate);

        Ok(SearchOutcome {
            result: self.result.clone(),
            decision,
            viewport: self.viewport,
        })
    }

    /// Begin, await the transport, complete.
    pub async fn submit_query(
        &mut self,
        text: &str,
        bias: Option<Coordinate>,
    ) -> Result<SearchOutcome, SearchError> {
        let ticket = self.begin_query(text, bias);
        let transport = self.transport();
        let response = transport.query(&ticket.text, ticket.bias).await;
        self.complete_query(ticket, response)
    }

    /// Drop the published result and return to the pre-search viewport.
    pub fn clear_results(&mut self) -> ViewportState {
        self.result = SearchResult::default();
        self.saved_backup = None;
        self.reconciler.forget();
        if let Some(previous) = self.previous_viewport.take() {
            self.viewport = previous;
        }
        self.viewport
    }

    /// The map finished a user pan or zoom at `(lat, lng, zoom)`.
    ///
    /// The map is already there, so the report is applied as-is and the
    /// reconciler sees a candidate equal to the current view. Reports with an
    /// invalid center are ignored.
    pub fn on_gesture_end(&mut self, lat: f64, lng: f64, zoom: i32) -> ViewDecision {
        let center = match Coordinate::new(lat, lng) {
            Ok(center) => center,
            Err(e) => {
                debug!("Ignoring gesture report: {}", e);
                return ViewDecision::NoOp;
            }
        };
        self.viewport = self.reconciler.settings().zoom.viewport(center, zoom);
        let candidate = ViewCandidate::from(self.viewport);
        self.apply(Some(candidate))
    }

    /// Fly to a published place, zooming in to at least the focus zoom.
    pub fn navigate_to(&mut self, id: &PlaceId) -> Option<ViewDecision> {
        let place = self.result.places.find(id)?;
        let zoom = self.viewport.zoom.max(self.focus_zoom);
        let candidate = ViewCandidate::at(place.coordinate, zoom as i32);
        Some(self.apply(Some(candidate)))
    }

    /// Programmatic move.
    pub fn set_view(&mut self, lat: f64, lng: f64, zoom: i32) -> ViewDecision {
        self.apply(Some(ViewCandidate::new(lat, lng, zoom)))
    }

    /// Re-render with the current place set.
    pub fn refresh_view(&mut self) -> ViewDecision {
        self.apply(None)
    }

    /// Show saved places in place of the current result.
    ///
    /// The result and viewport being replaced are kept in a single backup
    /// slot; browsing again while already browsing keeps the first backup.
    pub fn browse_saved(&mut self, places: PlaceSet) -> ViewDecision {
        if self.saved_backup.is_none() {
            self.saved_backup = Some(SavedBrowseBackup {
                result: self.result.clone(),
                viewport: self.viewport,
            });
        }
        self.result = SearchResult::new(SAVED_PLACES_SUMMARY, places, Vec::new());
        self.apply(None)
    }

    /// Leave saved places browsing, restoring what it replaced.
    pub fn exit_saved(&mut self) -> Option<ViewportState> {
        let backup = self.saved_backup.take()?;
        self.result = backup.result;
        self.viewport = backup.viewport;
        self.reconciler.mark_seen(&self.result.places);
        Some(self.viewport)
    }

    /// Persist the published places. Returns how many were new.
    pub async fn save_results(&self, store: &SavedPlacesStore) -> Result<usize, PersistenceError> {
        store.save_all(&self.result.places).await
    }

    /// Ask `geolocator` where the user is and center the map there.
    ///
    /// On failure the viewport is left alone.
    pub async fn locate_user(
        &mut self,
        geolocator: &dyn Geolocator,
    ) -> Result<ViewDecision, GeolocationError> {
        match geolocator.current_position().await {
            Ok(position) => {
                info!("User located at {}", position);
                self.user_location = Some(position);
                let candidate = ViewCandidate::at(position, self.focus_zoom as i32);
                Ok(self.apply(Some(candidate)))
            }
            Err(e) => {
                warn!("Could not locate user: {}", e);
                Err(e)
            }
        }
    }

    fn apply(&mut self, candidate: Option<ViewCandidate>) -> ViewDecision {
        let decision = self
            .reconciler
            .reconcile(&self.viewport, candidate, &self.result.places);
        self.viewport = decision.apply(self.viewport);
        decision
    }
}
