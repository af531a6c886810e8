//! GPX track statistics and video timeline synchronization for 360° tours.
//!
//! The same engine backs tour creation (statistics stored with the tour) and
//! the browser player (live position and stats during playback), so both
//! sides agree on every number they show.

pub mod error;
pub mod format;
pub mod geodesy;
pub mod geojson_export;
pub mod options;
pub mod parser;
pub mod report;
pub mod stats;
pub mod sync;
pub mod track_types;

use std::cell::RefCell;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use crate::error::{ParseError, SyncError, TrackError};
pub use crate::options::{SyncOptions, TimeScale};
pub use crate::stats::{TrackAnalysis, analyze};
pub use crate::sync::{LiveReadout, SyncStrategy, Timeline, point_at_time, synchronize};
pub use crate::track_types::*;

/// Parse a GPX string and return `{ name, metadata, points, statistics }`.
#[wasm_bindgen(js_name = analyzeTrack)]
pub fn analyze_track(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let player = TrackPlayer::new(gpx_string)?;
    Ok(to_js(&AnalyzedTrack {
        name: &player.name,
        metadata: &player.metadata,
        analysis: &player.analysis,
    })?)
}

/// Parse a GPX string and place its points on a video of the given length.
#[wasm_bindgen(js_name = synchronizeTrack)]
pub fn synchronize_track(
    gpx_string: &str,
    video_duration: f64,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    TrackPlayer::new(gpx_string)?.synchronize(video_duration, options)
}

/// Build the tour GPS payload: track, statistics and, when the video
/// duration is known, the synchronized points.
#[wasm_bindgen(js_name = trackReport)]
pub fn track_report(gpx_string: &str, video_duration: Option<f64>) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let track = parser::parse_track(gpx_string).map_err(TrackError::from)?;
    let report = report::TrackReport::build(&track, video_duration);
    Ok(to_js(&report)?)
}

/// Convert a GPX track to a GeoJSON Feature, returned as a JSON string.
#[wasm_bindgen(js_name = trackToGeoJsonString)]
pub fn track_to_geojson_string(gpx_string: &str) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let player = TrackPlayer::new(gpx_string)?;
    let feature = geojson_export::to_feature(&player.name, &player.analysis);
    serde_json::to_string(&feature).map_err(|e| TrackError::from(e).into())
}

#[wasm_bindgen(js_name = formatTime)]
pub fn format_time(seconds: f64) -> String {
    format::format_time(seconds)
}

#[wasm_bindgen(js_name = formatDistance)]
pub fn format_distance(km: f64) -> String {
    format::format_distance(km)
}

#[wasm_bindgen(js_name = formatSpeed)]
pub fn format_speed(kmh: f64) -> String {
    format::format_speed(kmh)
}

#[wasm_bindgen(js_name = formatElevation)]
pub fn format_elevation(meters: f64) -> String {
    format::format_elevation(meters)
}

/// A parsed and analysed track, held by the player for the length of a
/// playback session.
#[wasm_bindgen]
pub struct TrackPlayer {
    name: String,
    metadata: Option<TrackMetadata>,
    analysis: TrackAnalysis,
    timeline: RefCell<Timeline>,
}

#[wasm_bindgen]
impl TrackPlayer {
    #[wasm_bindgen(constructor)]
    pub fn new(gpx_string: &str) -> Result<TrackPlayer, JsValue> {
        console_error_panic_hook::set_once();

        let track = parser::parse_track(gpx_string).map_err(TrackError::from)?;
        Ok(Self {
            analysis: analyze(&track.points),
            name: track.name,
            metadata: track.metadata,
            timeline: RefCell::new(Timeline::default()),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.name.clone()
    }

    /// Author, link and time from `<metadata>`, or `null`.
    pub fn metadata(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.metadata)?)
    }

    pub fn statistics(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.analysis.statistics)?)
    }

    pub fn points(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.analysis.points)?)
    }

    pub fn synchronize(&self, video_duration: f64, options: JsValue) -> Result<JsValue, JsValue> {
        let opts = parse_options(options)?;
        let synced =
            sync::synchronize(&self.analysis, video_duration, &opts).map_err(TrackError::from)?;
        Ok(to_js(&synced)?)
    }

    /// The point closest to `video_time`, or `null` when the track has no
    /// points to show.
    #[wasm_bindgen(js_name = pointAtTime)]
    pub fn point_at_time(
        &self,
        video_time: f64,
        video_duration: f64,
        options: JsValue,
    ) -> Result<JsValue, JsValue> {
        let opts = parse_options(options)?;
        let mut timeline = self.timeline.borrow_mut();
        let synced = timeline
            .points(&self.analysis, video_duration, &opts)
            .map_err(TrackError::from)?;
        match sync::point_at_time(synced, video_time) {
            Ok(point) => Ok(to_js(point)?),
            Err(SyncError::EmptyTrack) => Ok(JsValue::NULL),
            Err(e) => Err(TrackError::from(e).into()),
        }
    }

    /// Live stats for the player panel, or `null` when there is no GPS data.
    #[wasm_bindgen(js_name = liveReadout)]
    pub fn live_readout(
        &self,
        video_time: f64,
        video_duration: f64,
        options: JsValue,
    ) -> Result<JsValue, JsValue> {
        let opts = parse_options(options)?;
        let mut timeline = self.timeline.borrow_mut();
        let synced = timeline
            .points(&self.analysis, video_duration, &opts)
            .map_err(TrackError::from)?;
        match sync::point_at_time(synced, video_time) {
            Ok(point) => {
                let total_km = self.analysis.statistics.total_distance_km;
                Ok(to_js(&LiveReadout::from_point(point, total_km))?)
            }
            Err(SyncError::EmptyTrack) => Ok(JsValue::NULL),
            Err(e) => Err(TrackError::from(e).into()),
        }
    }

    #[wasm_bindgen(js_name = pathCoordinates)]
    pub fn path_coordinates(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.analysis.path_coordinates())?)
    }

    /// `{ southwest: [lat, lon], northeast: [lat, lon] }`, or `null` for an
    /// empty track.
    pub fn bounds(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.analysis.bounds().map(Corners::from))?)
    }

    #[wasm_bindgen(js_name = elevationProfile)]
    pub fn elevation_profile(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.analysis.elevation_profile())?)
    }

    #[wasm_bindgen(js_name = speedProfile)]
    pub fn speed_profile(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&self.analysis.speed_profile())?)
    }

    #[wasm_bindgen(js_name = toGeoJson)]
    pub fn to_geojson(&self) -> Result<JsValue, JsValue> {
        Ok(to_js(&geojson_export::to_feature(&self.name, &self.analysis))?)
    }
}

#[derive(Serialize)]
struct AnalyzedTrack<'a> {
    name: &'a str,
    metadata: &'a Option<TrackMetadata>,
    #[serde(flatten)]
    analysis: &'a TrackAnalysis,
}

/// Serialize to a plain JS object (maps as objects, not `Map`).
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, TrackError> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    Ok(value.serialize(&serializer)?)
}

fn parse_options(options: JsValue) -> Result<SyncOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(SyncOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| TrackError::Options(e.to_string()).into())
    }
}
