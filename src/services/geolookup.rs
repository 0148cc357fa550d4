//! Static location resolver for well-known place names.
//!
//! Resolves a handful of major cities to lat/lng so a user can say
//! `--near tokyo` instead of typing coordinates. Anything not listed has to
//! be given as a `lat,lng` pair.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::Coordinate;

/// Lowercase name -> (latitude, longitude).
static NOTABLE_LOCATIONS: LazyLock<HashMap<&'static str, (f64, f64)>> = LazyLock::new(|| {
    HashMap::from([
        // North America
        ("new york", (40.7128, -74.0060)),
        ("nyc", (40.7128, -74.0060)),
        ("los angeles", (34.0522, -118.2437)),
        ("chicago", (41.8781, -87.6298)),
        ("san francisco", (37.7749, -122.4194)),
        ("seattle", (47.6062, -122.3321)),
        ("washington dc", (38.9072, -77.0369)),
        ("washington d.c.", (38.9072, -77.0369)),
        ("boston", (42.3601, -71.0589)),
        ("toronto", (43.6532, -79.3832)),
        ("vancouver", (49.2827, -123.1207)),
        ("mexico city", (19.4326, -99.1332)),
        // South America
        ("sao paulo", (-23.5505, -46.6333)),
        ("buenos aires", (-34.6037, -58.3816)),
        ("rio de janeiro", (-22.9068, -43.1729)),
        ("lima", (-12.0464, -77.0428)),
        // Europe
        ("london", (51.5074, -0.1278)),
        ("paris", (48.8566, 2.3522)),
        ("berlin", (52.5200, 13.4050)),
        ("madrid", (40.4168, -3.7038)),
        ("rome", (41.9028, 12.4964)),
        ("amsterdam", (52.3676, 4.9041)),
        ("vienna", (48.2082, 16.3738)),
        ("stockholm", (59.3293, 18.0686)),
        ("istanbul", (41.0082, 28.9784)),
        // Africa and Middle East
        ("cairo", (30.0444, 31.2357)),
        ("lagos", (6.5244, 3.3792)),
        ("nairobi", (-1.2921, 36.8219)),
        ("cape town", (-33.9249, 18.4241)),
        ("dubai", (25.2048, 55.2708)),
        // Asia and Oceania
        ("tokyo", (35.6762, 139.6503)),
        ("seoul", (37.5665, 126.9780)),
        ("beijing", (39.9042, 116.4074)),
        ("shanghai", (31.2304, 121.4737)),
        ("hong kong", (22.3193, 114.1694)),
        ("singapore", (1.3521, 103.8198)),
        ("bangkok", (13.7563, 100.5018)),
        ("mumbai", (19.0760, 72.8777)),
        ("delhi", (28.7041, 77.1025)),
        ("sydney", (-33.8688, 151.2093)),
        ("melbourne", (-37.8136, 144.9631)),
        ("auckland", (-36.8485, 174.7633)),
    ])
});

/// Look up coordinates for a location name. Case-insensitive.
pub fn lookup(location_name: &str) -> Option<Coordinate> {
    let key = location_name.trim().to_lowercase();
    let &(lat, lng) = NOTABLE_LOCATIONS.get(key.as_str())?;
    Coordinate::new(lat, lng).ok()
}

/// Resolve either a `lat,lng` pair or a known location name.
pub fn resolve(input: &str) -> Option<Coordinate> {
    Coordinate::parse_pair(input).or_else(|| lookup(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        let tokyo = lookup("Tokyo").unwrap();
        assert!((tokyo.lat() - 35.6762).abs() < 1e-9);
        assert!(lookup("  LONDON ").is_some());
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("atlantis").is_none());
    }

    #[test]
    fn test_resolve_prefers_pair() {
        let c = resolve("12.5, -7.25").unwrap();
        assert_eq!(c.lat(), 12.5);
        assert_eq!(resolve("paris").unwrap().lng(), 2.3522);
        assert!(resolve("200,0").is_none());
    }

    #[test]
    fn test_all_entries_valid() {
        for (name, (lat, lng)) in NOTABLE_LOCATIONS.iter() {
            assert!(Coordinate::new(*lat, *lng).is_ok(), "{} is out of range", name);
        }
    }
}
