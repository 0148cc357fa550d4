//! Bounding boxes and Web Mercator zoom fitting.

use std::f64::consts::PI;

use serde::Serialize;

use crate::models::{Coordinate, ZoomRange};

/// Tile edge length in pixels at zoom 0.
const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// Smallest rectangle enclosing a set of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Enclose all given coordinates. `None` for an empty input.
    pub fn enclosing<'a, I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            south: first.lat(),
            west: first.lng(),
            north: first.lat(),
            east: first.lng(),
        };
        for c in iter {
            bounds.south = bounds.south.min(c.lat());
            bounds.north = bounds.north.max(c.lat());
            bounds.west = bounds.west.min(c.lng());
            bounds.east = bounds.east.max(c.lng());
        }
        Some(bounds)
    }

    pub fn south_west(&self) -> Coordinate {
        Coordinate::from_validated(self.south, self.west)
    }

    pub fn north_east(&self) -> Coordinate {
        Coordinate::from_validated(self.north, self.east)
    }

    pub fn center(&self) -> Coordinate {
        self.south_west().midpoint(&self.north_east())
    }

    /// Largest zoom at which these bounds, inset by `padding_px` on every
    /// side, fit a viewport of `width_px` x `height_px`.
    ///
    /// The result never exceeds `max_zoom` and never drops below
    /// `range.min`.
    pub fn fit_zoom(
        &self,
        width_px: u32,
        height_px: u32,
        padding_px: u32,
        max_zoom: u8,
        range: ZoomRange,
    ) -> u8 {
        let avail_w = (width_px as f64 - 2.0 * padding_px as f64).max(1.0);
        let avail_h = (height_px as f64 - 2.0 * padding_px as f64).max(1.0);
        let top = range.clamp(max_zoom as i32);

        for zoom in (range.min..=top).rev() {
            let (x1, y1) = project(self.north, self.west, zoom);
            let (x2, y2) = project(self.south, self.east, zoom);
            if (x2 - x1).abs() <= avail_w && (y2 - y1).abs() <= avail_h {
                return zoom;
            }
        }
        range.min
    }
}

/// Web Mercator pixel position at an integer zoom.
fn project(lat: f64, lng: f64, zoom: u8) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powi(zoom as i32);
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_enclosing() {
        let pts = [c(40.0, -74.0), c(41.0, -73.5), c(40.5, -75.0)];
        let b = Bounds::enclosing(&pts).unwrap();
        assert_eq!(b.south, 40.0);
        assert_eq!(b.north, 41.0);
        assert_eq!(b.west, -75.0);
        assert_eq!(b.east, -73.5);
        assert_eq!(b.center(), c(40.5, -74.25));
    }

    #[test]
    fn test_enclosing_empty() {
        assert!(Bounds::enclosing(&Vec::<Coordinate>::new()).is_none());
    }

    #[test]
    fn test_single_point_capped() {
        let b = Bounds::enclosing(&[c(40.0, -74.0)]).unwrap();
        assert_eq!(b.fit_zoom(1024, 768, 50, 15, ZoomRange::default()), 15);
    }

    #[test]
    fn test_wide_bounds_zoom_out() {
        let city = Bounds::enclosing(&[c(40.70, -74.02), c(40.80, -73.93)]).unwrap();
        let continent = Bounds::enclosing(&[c(25.0, -124.0), c(49.0, -67.0)]).unwrap();
        let range = ZoomRange::default();
        let z_city = city.fit_zoom(1024, 768, 50, 15, range);
        let z_cont = continent.fit_zoom(1024, 768, 50, 15, range);
        assert!(z_city > z_cont);
        assert!(z_city <= 15);
        assert!(z_cont >= range.min);
    }

    #[test]
    fn test_padding_never_increases_zoom() {
        let b = Bounds::enclosing(&[c(40.70, -74.02), c(40.80, -73.93)]).unwrap();
        let range = ZoomRange::default();
        let tight = b.fit_zoom(1024, 768, 0, 18, range);
        let padded = b.fit_zoom(1024, 768, 200, 18, range);
        assert!(padded <= tight);
    }

    #[test]
    fn test_world_falls_back_to_min() {
        let b = Bounds::enclosing(&[c(-80.0, -179.0), c(80.0, 179.0)]).unwrap();
        assert_eq!(b.fit_zoom(256, 256, 50, 15, ZoomRange::default()), 3);
    }
}
