//! End-to-end search flow tests
//!
//! Drives a `SearchSession` through the public API with an in-memory
//! transport, from query text to published places and map decisions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};

use mapsearch::config::MapConfig;
use mapsearch::llm::{SearchTransport, TransportError, TransportResponse};
use mapsearch::models::{Coordinate, GroundingSource, SequentialIds};
use mapsearch::services::{
    CoordinateExtractor, SearchError, SearchSession, ViewDecision, SEARCH_FAILED_MESSAGE,
};
use mapsearch::storage::SavedPlacesStore;

const THREE_PARKS: &str = "\
Here are some parks:
1. **Central Park** (lat: 40.7829, lng: -73.9654)
2. **Prospect Park** (lat: 40.6602, lng: -73.9690)
3. **Flushing Meadows** (lat: 40.7400, lng: -73.8407)";

/// Answers every query from a fixed script, keyed by query text.
struct ScriptedTransport {
    script: HashMap<String, Result<TransportResponse, TransportError>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self {
            script: HashMap::new(),
        }
    }

    fn answer(mut self, query: &str, text: &str) -> Self {
        self.script.insert(
            query.to_string(),
            Ok(TransportResponse {
                text: text.to_string(),
                sources: GroundingSource::new("https://maps.google.com/?cid=1", "Google Maps")
                    .into_iter()
                    .collect(),
            }),
        );
        self
    }

    fn fail(mut self, query: &str, error: TransportError) -> Self {
        self.script.insert(query.to_string(), Err(error));
        self
    }
}

#[async_trait]
impl SearchTransport for ScriptedTransport {
    async fn query(
        &self,
        text: &str,
        _bias: Option<Coordinate>,
    ) -> Result<TransportResponse, TransportError> {
        self.script
            .get(text)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Api(format!("unscripted query: {}", text))))
    }
}

/// Holds each query until the test releases it.
struct GatedTransport {
    gates: Mutex<HashMap<String, oneshot::Receiver<TransportResponse>>>,
}

#[async_trait]
impl SearchTransport for GatedTransport {
    async fn query(
        &self,
        text: &str,
        _bias: Option<Coordinate>,
    ) -> Result<TransportResponse, TransportError> {
        let gate = self.gates.lock().await.remove(text);
        match gate {
            Some(rx) => rx
                .await
                .map_err(|_| TransportError::Connection("gate dropped".to_string())),
            None => Err(TransportError::Api(format!("no gate for {}", text))),
        }
    }
}

fn session(transport: impl SearchTransport + 'static) -> SearchSession {
    SearchSession::new(Arc::new(transport), &MapConfig::default())
        .with_extractor(CoordinateExtractor::new(Arc::new(SequentialIds::new())))
}

fn response(text: &str) -> TransportResponse {
    TransportResponse {
        text: text.to_string(),
        sources: Vec::new(),
    }
}

#[test]
fn test_extraction_scenarios() {
    let extractor = CoordinateExtractor::new(Arc::new(SequentialIds::new()));

    let places = extractor.extract_all(
        "**Central Park** is great (lat: 40.7829, lng: -73.9654) - a big green space.",
    );
    assert_eq!(places.len(), 1);
    assert_eq!(places[0].name, "Central Park");
    assert_eq!(places[0].coordinate.lat(), 40.7829);
    assert_eq!(places[0].coordinate.lng(), -73.9654);

    assert!(extractor
        .extract_all("Try this spot (lat: abc, lng: -73.9).")
        .is_empty());

    let places = extractor.extract_all(
        "**A** (lat: 1.0, lng: 2.0)\n**Bad** (lat: 999, lng: 2.0)\n**C** (lat: 3.0, lng: 4.0)",
    );
    let names: Vec<_> = places.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);
}

#[tokio::test]
async fn test_new_search_fits_all_places() {
    let mut s = session(ScriptedTransport::new().answer("parks", THREE_PARKS));

    let outcome = s.submit_query("parks", None).await.unwrap();
    assert_eq!(outcome.result.places.len(), 3);
    assert_eq!(outcome.result.sources.len(), 1);

    match outcome.decision {
        ViewDecision::FitBounds {
            bounds,
            padding_px,
            viewport,
        } => {
            assert_eq!(padding_px, 50);
            assert!(viewport.zoom <= 15);
            for place in outcome.result.places.iter() {
                let c = place.coordinate;
                assert!(c.lat() >= bounds.south && c.lat() <= bounds.north);
                assert!(c.lng() >= bounds.west && c.lng() <= bounds.east);
            }
            assert_eq!(s.viewport(), viewport);
        }
        other => panic!("expected fit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fit_once_per_result() {
    let mut s = session(ScriptedTransport::new().answer("parks", THREE_PARKS));

    s.submit_query("parks", None).await.unwrap();
    assert_eq!(s.refresh_view(), ViewDecision::NoOp);
    assert_eq!(s.refresh_view(), ViewDecision::NoOp);

    // Same text again is still a new result
    s.on_gesture_end(0.0, 0.0, 5);
    let outcome = s.submit_query("parks", None).await.unwrap();
    assert!(matches!(outcome.decision, ViewDecision::FitBounds { .. }));
}

#[tokio::test]
async fn test_gesture_does_not_fly() {
    let mut s = session(ScriptedTransport::new().answer("parks", THREE_PARKS));
    s.submit_query("parks", None).await.unwrap();

    let before = s.viewport();
    // ~200 m north
    let lat = before.center.lat() + 0.0018;
    let decision = s.on_gesture_end(lat, before.center.lng(), before.zoom as i32);

    assert_eq!(decision, ViewDecision::NoOp);
    assert_eq!(s.viewport().center.lat(), lat);
    assert_eq!(s.viewport().zoom, before.zoom);
}

#[tokio::test]
async fn test_clear_restores_pre_search_view() {
    let mut s = session(ScriptedTransport::new().answer("parks", THREE_PARKS));
    s.on_gesture_end(48.8566, 2.3522, 11);
    let before = s.viewport();

    s.submit_query("parks", None).await.unwrap();
    assert_ne!(s.viewport(), before);

    let restored = s.clear_results();
    assert_eq!(restored, before);
    assert_eq!(s.viewport(), before);
    assert!(s.result().places.is_empty());
}

#[tokio::test]
async fn test_failure_keeps_previous_result() {
    let mut s = session(
        ScriptedTransport::new()
            .answer("parks", THREE_PARKS)
            .fail("museums", TransportError::Auth("bad key".to_string())),
    );
    s.submit_query("parks", None).await.unwrap();
    let view = s.viewport();

    let err = s.submit_query("museums", None).await.unwrap_err();
    assert!(matches!(err, SearchError::Transport(TransportError::Auth(_))));
    assert_eq!(err.user_message(), Some(SEARCH_FAILED_MESSAGE));
    assert_eq!(s.result().places.len(), 3);
    assert_eq!(s.viewport(), view);
    assert!(!s.is_busy());
}

#[tokio::test]
async fn test_superseded_response_discarded() {
    let (tx_a, rx_a) = oneshot::channel();
    let (tx_b, rx_b) = oneshot::channel();
    let transport = GatedTransport {
        gates: Mutex::new(HashMap::from([
            ("a".to_string(), rx_a),
            ("b".to_string(), rx_b),
        ])),
    };
    let mut s = session(transport);

    let ticket_a = s.begin_query("a", None);
    let transport = s.transport();
    let task_a = tokio::spawn(async move {
        let r = transport.query(&ticket_a.text, ticket_a.bias).await;
        (ticket_a, r)
    });

    let ticket_b = s.begin_query("b", None);
    let transport = s.transport();
    let task_b = tokio::spawn(async move {
        let r = transport.query(&ticket_b.text, ticket_b.bias).await;
        (ticket_b, r)
    });

    tx_b.send(response("**B** (lat: 10.0, lng: 10.0)")).unwrap();
    let (ticket, r) = task_b.await.unwrap();
    s.complete_query(ticket, r).unwrap();

    tx_a.send(response("**A** (lat: 20.0, lng: 20.0)")).unwrap();
    let (ticket, r) = task_a.await.unwrap();
    let err = s.complete_query(ticket, r).unwrap_err();

    assert!(matches!(err, SearchError::Superseded { .. }));
    assert_eq!(s.result().places.len(), 1);
    assert_eq!(s.result().places[0].name, "B");
}

#[tokio::test]
async fn test_save_and_browse_saved() {
    let dir = tempfile::tempdir().unwrap();
    let store = SavedPlacesStore::open(dir.path().join("saved_places.json"));
    let mut s = session(ScriptedTransport::new().answer("parks", THREE_PARKS));

    s.submit_query("parks", None).await.unwrap();
    assert_eq!(s.save_results(&store).await.unwrap(), 3);
    assert_eq!(s.save_results(&store).await.unwrap(), 0);

    let search_view = s.viewport();
    s.on_gesture_end(0.0, 0.0, 4);
    let pre_browse = s.viewport();

    let decision = s.browse_saved(store.places().await.unwrap());
    assert!(matches!(decision, ViewDecision::FitBounds { .. }));
    assert_eq!(s.result().places.len(), 3);
    assert_ne!(s.viewport(), pre_browse);

    assert_eq!(s.exit_saved(), Some(pre_browse));
    assert_ne!(pre_browse, search_view);
}
