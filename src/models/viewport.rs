//! Map viewport state.

use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;

/// Allowed integer zoom levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 3, max: 18 }
    }
}

impl ZoomRange {
    /// Build a range; swapped bounds are reordered.
    pub fn new(min: u8, max: u8) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn clamp(&self, zoom: i32) -> u8 {
        zoom.clamp(self.min as i32, self.max as i32) as u8
    }

    pub fn viewport(&self, center: Coordinate, zoom: i32) -> ViewportState {
        ViewportState {
            center,
            zoom: self.clamp(zoom),
        }
    }
}

/// The map's visible center and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub center: Coordinate,
    pub zoom: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_clamped() {
        let range = ZoomRange::default();
        let center = Coordinate::new(0.0, 0.0).unwrap();
        assert_eq!(range.viewport(center, 25).zoom, 18);
        assert_eq!(range.viewport(center, -4).zoom, 3);
        assert_eq!(range.viewport(center, 10).zoom, 10);
    }

    #[test]
    fn test_swapped_range() {
        assert_eq!(ZoomRange::new(18, 3), ZoomRange::new(3, 18));
    }
}
