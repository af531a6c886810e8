use crate::track_types::{Bounds, TrackPoint};

/// Mean Earth radius used by every distance in the crate.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two WGS84 positions (Haversine).
///
/// Coordinates are decimal degrees and are not range-checked.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Clamp rounding overshoot so sqrt(1 - a) stays real for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Distance in meters between two track points.
pub fn point_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Bounding box of the points, or `None` for an empty slice.
pub fn track_bounds<'a, I>(points: I) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a TrackPoint>,
{
    points.into_iter().fold(None, |acc, p| {
        Some(match acc {
            None => Bounds {
                min_lat: p.latitude,
                max_lat: p.latitude,
                min_lon: p.longitude,
                max_lon: p.longitude,
            },
            Some(b) => Bounds {
                min_lat: b.min_lat.min(p.latitude),
                max_lat: b.max_lat.max(p.latitude),
                min_lon: b.min_lon.min(p.longitude),
                max_lon: b.max_lon.max(p.longitude),
            },
        })
    })
}
