use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure to turn a GPX document into track points.
///
/// The parser is strict: a single malformed `<trkpt>` rejects the whole
/// document instead of silently dropping the point.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("Missing attribute '{attribute}' on <{element}> #{index}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
        index: usize,
    },

    #[error("Invalid value '{value}' for attribute '{attribute}' on <{element}> #{index}")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
        index: usize,
    },

    #[error("Invalid elevation '{value}' on track point #{index}")]
    InvalidElevation { value: String, index: usize },

    #[error("Invalid timestamp '{value}' on track point #{index}: {source}")]
    InvalidTimestamp {
        value: String,
        index: usize,
        #[source]
        source: time::error::Parse,
    },

    #[error("Unexpected end of document inside <{element}>")]
    UnexpectedEof { element: String },

    #[error("No track points found in GPX document")]
    NoTrackPoints,

    #[error("Failed to read GPX file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to place a track on a video timeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// The track has no points; callers render a "no GPS data" state.
    #[error("Track has no points to synchronize")]
    EmptyTrack,

    #[error("Video duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
}

/// Any failure surfaced through the WebAssembly entry points.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Invalid options: {0}")]
    Options(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<TrackError> for JsValue {
    fn from(e: TrackError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for TrackError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}
