//! Map viewport reconciliation.
//!
//! Decides how the map should move when a new viewport is requested: fit a
//! freshly published place set, fly to a different center or zoom, or leave
//! the map alone. Leaving it alone when a gesture re-reports the viewport
//! the map already shows is what keeps user panning from being overridden.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::MapConfig;
use crate::geo::Bounds;
use crate::models::{Coordinate, PlaceSet, ViewportState, ZoomRange};

/// Center movement (degrees) below which two centers count as equal.
pub const CENTER_EPSILON_DEG: f64 = 1e-5;

/// A requested viewport, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCandidate {
    pub lat: f64,
    pub lng: f64,
    pub zoom: i32,
}

impl ViewCandidate {
    pub fn new(lat: f64, lng: f64, zoom: i32) -> Self {
        Self { lat, lng, zoom }
    }

    pub fn at(center: Coordinate, zoom: i32) -> Self {
        Self::new(center.lat(), center.lng(), zoom)
    }
}

impl From<ViewportState> for ViewCandidate {
    fn from(view: ViewportState) -> Self {
        Self::at(view.center, view.zoom as i32)
    }
}

/// The reconciler's verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewDecision {
    /// Size and position the map to enclose `bounds`, inset by `padding_px`.
    FitBounds {
        bounds: Bounds,
        padding_px: u32,
        viewport: ViewportState,
    },
    /// Animate to `viewport` over `duration_ms`.
    FlyTo {
        viewport: ViewportState,
        duration_ms: u64,
    },
    NoOp,
}

impl ViewDecision {
    /// The viewport after this decision is carried out.
    pub fn apply(&self, current: ViewportState) -> ViewportState {
        match self {
            ViewDecision::FitBounds { viewport, .. } | ViewDecision::FlyTo { viewport, .. } => {
                *viewport
            }
            ViewDecision::NoOp => current,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, ViewDecision::NoOp)
    }
}

/// Fixed parameters of the reconciliation policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileSettings {
    pub zoom: ZoomRange,
    /// Fit-to-bounds never zooms in past this level.
    pub fit_max_zoom: u8,
    pub fit_padding_px: u32,
    pub viewport_width_px: u32,
    pub viewport_height_px: u32,
    pub fly_duration: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self::from(&MapConfig::default())
    }
}

impl From<&MapConfig> for ReconcileSettings {
    fn from(map: &MapConfig) -> Self {
        Self {
            zoom: map.zoom_range(),
            fit_max_zoom: map.fit_max_zoom,
            fit_padding_px: map.fit_padding_px,
            viewport_width_px: map.viewport_width_px,
            viewport_height_px: map.viewport_height_px,
            fly_duration: Duration::from_millis(map.fly_duration_ms),
        }
    }
}

/// Stateful reconciler. Remembers the last place set it saw so a re-render
/// of the same result never triggers a second fit.
#[derive(Debug, Clone)]
pub struct ViewReconciler {
    settings: ReconcileSettings,
    last_places: Option<PlaceSet>,
}

impl ViewReconciler {
    pub fn new(settings: ReconcileSettings) -> Self {
        Self {
            settings,
            last_places: None,
        }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// Forget the previously reconciled place set.
    pub fn forget(&mut self) {
        self.last_places = None;
    }

    /// Treat `places` as already on screen, so it is not fitted again.
    pub fn mark_seen(&mut self, places: &PlaceSet) {
        self.last_places = Some(places.clone());
    }

    /// Decide the next viewport.
    ///
    /// Priority: fit a newly seen non-empty place set, then fly to a valid
    /// candidate that differs from `current`, else no-op.
    pub fn reconcile(
        &mut self,
        current: &ViewportState,
        candidate: Option<ViewCandidate>,
        places: &PlaceSet,
    ) -> ViewDecision {
        let is_new_set = !self
            .last_places
            .as_ref()
            .is_some_and(|prev| prev.same_set(places));
        self.last_places = Some(places.clone());

        if is_new_set {
            if let Some(fit) = self.fit(places) {
                debug!("Fitting {} places", places.len());
                return fit;
            }
        }

        let Some(candidate) = candidate else {
            return ViewDecision::NoOp;
        };
        let center = match Coordinate::new(candidate.lat, candidate.lng) {
            Ok(center) => center,
            Err(e) => {
                debug!("Ignoring view candidate: {}", e);
                return ViewDecision::NoOp;
            }
        };
        let zoom = self.settings.zoom.clamp(candidate.zoom);

        if center.degree_distance(&current.center) > CENTER_EPSILON_DEG || zoom != current.zoom {
            return ViewDecision::FlyTo {
                viewport: ViewportState { center, zoom },
                duration_ms: self.settings.fly_duration.as_millis() as u64,
            };
        }

        ViewDecision::NoOp
    }

    /// Fit decision for `places`, or `None` when there is nothing to enclose.
    pub fn fit(&self, places: &PlaceSet) -> Option<ViewDecision> {
        let bounds = Bounds::enclosing(places.iter().map(|p| &p.coordinate))?;
        let s = &self.settings;
        let zoom = bounds.fit_zoom(
            s.viewport_width_px,
            s.viewport_height_px,
            s.fit_padding_px,
            s.fit_max_zoom,
            s.zoom,
        );
        Some(ViewDecision::FitBounds {
            bounds,
            padding_px: s.fit_padding_px,
            viewport: s.zoom.viewport(bounds.center(), zoom as i32),
        })
    }
}
