use serde::Serialize;
use time::OffsetDateTime;

/// Track name used when the document's `<trk>` carries no `<name>`.
pub const UNNAMED_TRACK: &str = "Unnamed Track";

/// A single GPS sample (`<trkpt>`), as read from the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters. `None` when the point has no `<ele>`; formulas treat it as 0.
    pub elevation: Option<f64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    /// 0-based position in the document.
    pub sequence_index: usize,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, sequence_index: usize) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            timestamp: None,
            sequence_index,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Elevation with the documented zero default for missing `<ele>`.
    pub fn elevation_or_default(&self) -> f64 {
        self.elevation.unwrap_or(0.0)
    }

    /// Seconds elapsed from `earlier` to `self`, if both carry a timestamp.
    pub fn seconds_since(&self, earlier: &TrackPoint) -> Option<f64> {
        match (self.timestamp, earlier.timestamp) {
            (Some(t), Some(t0)) => Some((t - t0).as_seconds_f64()),
            _ => None,
        }
    }
}

/// A track point plus the values derived from the segment ending at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTrackPoint {
    #[serde(flatten)]
    pub point: TrackPoint,
    pub cumulative_distance_meters: f64,
    pub instantaneous_speed_kmh: f64,
    pub grade_percent: f64,
}

impl EnrichedTrackPoint {
    /// A point with every derived field at zero (first point, short tracks).
    pub fn unenriched(point: TrackPoint) -> Self {
        Self {
            point,
            cumulative_distance_meters: 0.0,
            instantaneous_speed_kmh: 0.0,
            grade_percent: 0.0,
        }
    }
}

/// Aggregates over a whole track.
///
/// With fewer than two points every numeric field is zero, including the
/// altitude extremes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStatistics {
    pub point_count: usize,
    pub total_distance_km: f64,
    pub total_duration_seconds: f64,
    pub elevation_gain_meters: f64,
    pub elevation_loss_meters: f64,
    pub max_altitude_meters: f64,
    pub min_altitude_meters: f64,
    pub average_altitude_meters: f64,
    pub max_speed_kmh: f64,
    pub average_speed_kmh: f64,
    /// At least one point carried `<ele>`.
    pub has_elevation: bool,
    /// At least one point carried `<time>`.
    pub has_timestamps: bool,
}

/// A track point placed on a video timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynchronizedPoint {
    #[serde(flatten)]
    pub point: EnrichedTrackPoint,
    pub video_time_seconds: f64,
    /// `video_time_seconds / video_duration_seconds`.
    pub normalized_time: f64,
}

/// Geographic bounding box of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn southwest(&self) -> [f64; 2] {
        [self.min_lat, self.min_lon]
    }

    pub fn northeast(&self) -> [f64; 2] {
        [self.max_lat, self.max_lon]
    }
}

/// `[lat, lon]` corners of a [`Bounds`], the shape map widgets fit to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Corners {
    pub southwest: [f64; 2],
    pub northeast: [f64; 2],
}

impl From<Bounds> for Corners {
    fn from(b: Bounds) -> Self {
        Self {
            southwest: b.southwest(),
            northeast: b.northeast(),
        }
    }
}

/// Descriptive `<metadata>` of a GPX document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    /// `<author><name>`.
    pub author: Option<String>,
    /// `href` of `<link>`.
    pub link: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub time: Option<OffsetDateTime>,
}

/// Output of the parser: the first track's name, the document metadata and
/// every `<trkpt>` in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTrack {
    pub name: String,
    /// `None` when the document has no `<metadata>` element.
    pub metadata: Option<TrackMetadata>,
    pub points: Vec<TrackPoint>,
}
