use serde::Deserialize;

/// Options for placing a track on a video timeline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Drop points whose video time lies past the end of the video (default: false)
    #[serde(default)]
    pub truncate_to_video: bool,

    /// How recorded time maps onto video time (default: stretch)
    #[serde(default)]
    pub time_scale: TimeScale,
}

impl SyncOptions {
    /// Policy used when a tour is created: recorded seconds map 1:1 onto the
    /// video and samples recorded after the video stopped are discarded.
    pub fn trip_creation() -> Self {
        Self {
            truncate_to_video: true,
            time_scale: TimeScale::RealTime,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeScale {
    /// The recorded interval is stretched to span the whole video.
    #[default]
    Stretch,
    /// One recorded second is one video second.
    RealTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let opts: SyncOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, SyncOptions::default());
        assert!(!opts.truncate_to_video);
        assert_eq!(opts.time_scale, TimeScale::Stretch);
    }

    #[test]
    fn test_camel_case_fields() {
        let opts: SyncOptions =
            serde_json::from_str(r#"{"truncateToVideo": true, "timeScale": "realTime"}"#).unwrap();
        assert_eq!(opts, SyncOptions::trip_creation());
    }
}
