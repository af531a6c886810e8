use serde::Serialize;
use time::OffsetDateTime;

use crate::geodesy::{point_distance, track_bounds};
use crate::track_types::*;

/// Meters per second to kilometers per hour.
pub const MPS_TO_KMH: f64 = 3.6;

/// Enriched points of a track together with its trip statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAnalysis {
    pub points: Vec<EnrichedTrackPoint>,
    pub statistics: TripStatistics,
}

/// One point of the elevation chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationSample {
    pub distance_meters: f64,
    pub elevation_meters: f64,
    pub grade_percent: f64,
}

/// One point of the speed chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedSample {
    pub distance_meters: f64,
    pub speed_kmh: f64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

/// Values derived from two consecutive points.
#[derive(Debug, Clone, Copy)]
struct Segment {
    distance_meters: f64,
    speed_kmh: f64,
    elevation_change: f64,
    grade_percent: f64,
}

impl Segment {
    fn between(prev: &TrackPoint, curr: &TrackPoint) -> Self {
        let distance_meters = point_distance(prev, curr);

        // Non-increasing timestamps leave the speed at zero.
        let speed_kmh = match curr.seconds_since(prev) {
            Some(elapsed) if elapsed > 0.0 => distance_meters / elapsed * MPS_TO_KMH,
            _ => 0.0,
        };

        let elevation_change = curr.elevation_or_default() - prev.elevation_or_default();
        let grade_percent = if distance_meters > 0.0 {
            elevation_change / distance_meters * 100.0
        } else {
            0.0
        };

        Self {
            distance_meters,
            speed_kmh,
            elevation_change,
            grade_percent,
        }
    }
}

/// Running totals carried through the fold.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    elevation_gain: f64,
    elevation_loss: f64,
    max_speed_kmh: f64,
}

impl Totals {
    fn add(self, seg: &Segment) -> Self {
        let (gain, loss) = if seg.elevation_change > 0.0 {
            (seg.elevation_change, 0.0)
        } else {
            (0.0, seg.elevation_change.abs())
        };
        Self {
            elevation_gain: self.elevation_gain + gain,
            elevation_loss: self.elevation_loss + loss,
            max_speed_kmh: self.max_speed_kmh.max(seg.speed_kmh),
        }
    }
}

/// Derive per-point fields and trip statistics from an ordered track.
///
/// Tracks with fewer than two points come back with every derived field and
/// every statistic at zero.
pub fn analyze(points: &[TrackPoint]) -> TrackAnalysis {
    let has_elevation = points.iter().any(|p| p.elevation.is_some());
    let has_timestamps = points.iter().any(|p| p.timestamp.is_some());

    let (first, last) = match points {
        [first, .., last] => (first, last),
        _ => {
            return TrackAnalysis {
                points: points.iter().cloned().map(EnrichedTrackPoint::unenriched).collect(),
                statistics: TripStatistics {
                    point_count: points.len(),
                    has_elevation,
                    has_timestamps,
                    ..TripStatistics::default()
                },
            };
        }
    };

    let seed = (
        vec![EnrichedTrackPoint::unenriched(first.clone())],
        Totals::default(),
    );
    let (enriched, totals) = points.windows(2).fold(seed, |(mut out, totals), pair| {
        let seg = Segment::between(&pair[0], &pair[1]);
        let travelled = out
            .last()
            .map_or(0.0, |p: &EnrichedTrackPoint| p.cumulative_distance_meters);
        out.push(EnrichedTrackPoint {
            point: pair[1].clone(),
            cumulative_distance_meters: travelled + seg.distance_meters,
            instantaneous_speed_kmh: seg.speed_kmh,
            grade_percent: seg.grade_percent,
        });
        (out, totals.add(&seg))
    });

    let total_distance_meters = enriched
        .last()
        .map_or(0.0, |p| p.cumulative_distance_meters);
    let total_distance_km = total_distance_meters / 1000.0;
    let total_duration_seconds = last.seconds_since(first).map_or(0.0, |d| d.max(0.0));
    let average_speed_kmh = if total_distance_km > 0.0 && total_duration_seconds > 0.0 {
        total_distance_km / total_duration_seconds * 3600.0
    } else {
        0.0
    };

    let (min_altitude, max_altitude, altitude_sum) = points
        .iter()
        .map(TrackPoint::elevation_or_default)
        .fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), ele| (lo.min(ele), hi.max(ele), sum + ele),
        );

    let statistics = TripStatistics {
        point_count: points.len(),
        total_distance_km,
        total_duration_seconds,
        elevation_gain_meters: totals.elevation_gain,
        elevation_loss_meters: totals.elevation_loss,
        max_altitude_meters: max_altitude,
        min_altitude_meters: min_altitude,
        average_altitude_meters: altitude_sum / points.len() as f64,
        max_speed_kmh: totals.max_speed_kmh,
        average_speed_kmh,
        has_elevation,
        has_timestamps,
    };

    log::debug!(
        "analyzed {} points: {:.3} km over {:.0} s, +{:.1}/-{:.1} m",
        statistics.point_count,
        statistics.total_distance_km,
        statistics.total_duration_seconds,
        statistics.elevation_gain_meters,
        statistics.elevation_loss_meters
    );

    TrackAnalysis {
        points: enriched,
        statistics,
    }
}

impl TrackAnalysis {
    /// `[lat, lon]` pairs for drawing the path on a map.
    pub fn path_coordinates(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|p| [p.point.latitude, p.point.longitude])
            .collect()
    }

    pub fn elevation_profile(&self) -> Vec<ElevationSample> {
        self.points
            .iter()
            .map(|p| ElevationSample {
                distance_meters: p.cumulative_distance_meters,
                elevation_meters: p.point.elevation_or_default(),
                grade_percent: p.grade_percent,
            })
            .collect()
    }

    pub fn speed_profile(&self) -> Vec<SpeedSample> {
        self.points
            .iter()
            .map(|p| SpeedSample {
                distance_meters: p.cumulative_distance_meters,
                speed_kmh: p.instantaneous_speed_kmh,
                timestamp: p.point.timestamp,
            })
            .collect()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        track_bounds(self.points.iter().map(|p| &p.point))
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.cumulative_distance_meters)
    }
}
