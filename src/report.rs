//! Payloads handed to the persistence/API layer.

use serde::Serialize;

use crate::options::SyncOptions;
use crate::stats::{TrackAnalysis, analyze};
use crate::sync::synchronize;
use crate::track_types::*;

/// Statistics in the shape the tour API responds with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    /// Kilometers.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    pub elevation_gain: f64,
    pub max_altitude: f64,
}

impl From<&TripStatistics> for StatsPayload {
    fn from(s: &TripStatistics) -> Self {
        Self {
            distance: s.total_distance_km,
            duration: s.total_duration_seconds,
            avg_speed: s.average_speed_kmh,
            max_speed: s.max_speed_kmh,
            elevation_gain: s.elevation_gain_meters,
            max_altitude: s.max_altitude_meters,
        }
    }
}

/// Columns stored alongside a tour record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourStatsRecord {
    pub distance_km: f64,
    pub elevation_gain: f64,
    pub duration_seconds: f64,
    pub max_speed: f64,
    pub max_altitude: f64,
}

impl From<&TripStatistics> for TourStatsRecord {
    fn from(s: &TripStatistics) -> Self {
        Self {
            distance_km: s.total_distance_km,
            elevation_gain: s.elevation_gain_meters,
            duration_seconds: s.total_duration_seconds,
            max_speed: s.max_speed_kmh,
            max_altitude: s.max_altitude_meters,
        }
    }
}

/// Everything the player needs for one tour's GPS track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackReport {
    pub name: String,
    /// Author, link and time from the document's `<metadata>`.
    pub metadata: Option<TrackMetadata>,
    pub bounds: Option<Bounds>,
    pub points: Vec<EnrichedTrackPoint>,
    /// Present only when the tour's video duration is known.
    pub synchronized: Option<Vec<SynchronizedPoint>>,
    pub statistics: StatsPayload,
}

impl TrackReport {
    /// Build the report for a parsed track. Synchronization uses the
    /// trip-creation policy and is skipped unless `video_duration_seconds`
    /// is a positive number.
    pub fn build(track: &ParsedTrack, video_duration_seconds: Option<f64>) -> Self {
        let analysis = analyze(&track.points);
        Self {
            metadata: track.metadata.clone(),
            ..Self::from_analysis(track.name.clone(), &analysis, video_duration_seconds)
        }
    }

    pub fn from_analysis(
        name: String,
        analysis: &TrackAnalysis,
        video_duration_seconds: Option<f64>,
    ) -> Self {
        let synchronized = video_duration_seconds
            .filter(|d| d.is_finite() && *d > 0.0)
            .and_then(|d| synchronize(analysis, d, &SyncOptions::trip_creation()).ok());

        Self {
            name,
            metadata: None,
            bounds: analysis.bounds(),
            points: analysis.points.clone(),
            synchronized,
            statistics: StatsPayload::from(&analysis.statistics),
        }
    }
}
