use serde::Serialize;

use crate::error::SyncError;
use crate::options::{SyncOptions, TimeScale};
use crate::stats::TrackAnalysis;
use crate::track_types::*;

type Result<T> = std::result::Result<T, SyncError>;

/// How track points are spread over the video timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncStrategy {
    /// Elapsed recording time decides the position.
    Timestamp,
    /// Distance travelled decides the position.
    Distance,
}

impl SyncStrategy {
    /// Timestamps are used when the first point has one and the track spans
    /// a positive duration; anything else falls back to distance.
    pub fn for_analysis(analysis: &TrackAnalysis) -> Self {
        let first_timed = analysis
            .points
            .first()
            .is_some_and(|p| p.point.timestamp.is_some());
        if first_timed && analysis.statistics.total_duration_seconds > 0.0 {
            Self::Timestamp
        } else {
            Self::Distance
        }
    }
}

/// Place every point of an analysed track on a video of the given length.
///
/// Output keeps the input order and length unless
/// [`SyncOptions::truncate_to_video`] drops points past the end of the video.
pub fn synchronize(
    analysis: &TrackAnalysis,
    video_duration_seconds: f64,
    opts: &SyncOptions,
) -> Result<Vec<SynchronizedPoint>> {
    if !(video_duration_seconds.is_finite() && video_duration_seconds > 0.0) {
        return Err(SyncError::InvalidDuration(video_duration_seconds));
    }

    let strategy = SyncStrategy::for_analysis(analysis);
    let times = match strategy {
        SyncStrategy::Timestamp => timestamp_times(analysis, video_duration_seconds, opts.time_scale),
        SyncStrategy::Distance => distance_times(analysis, video_duration_seconds),
    };

    let synced: Vec<SynchronizedPoint> = analysis
        .points
        .iter()
        .zip(times)
        .map(|(p, video_time_seconds)| SynchronizedPoint {
            point: p.clone(),
            video_time_seconds,
            normalized_time: video_time_seconds / video_duration_seconds,
        })
        .filter(|p| !opts.truncate_to_video || p.video_time_seconds <= video_duration_seconds)
        .collect();

    log::debug!(
        "synchronized {}/{} points onto {:.1} s of video ({:?})",
        synced.len(),
        analysis.points.len(),
        video_duration_seconds,
        strategy
    );

    Ok(synced)
}

/// Video times from elapsed recording time. A point without a timestamp
/// keeps the previous point's position.
fn timestamp_times(analysis: &TrackAnalysis, video_duration: f64, time_scale: TimeScale) -> Vec<f64> {
    let Some(first) = analysis.points.first() else {
        return Vec::new();
    };
    let scale = match time_scale {
        TimeScale::Stretch => video_duration / analysis.statistics.total_duration_seconds,
        TimeScale::RealTime => 1.0,
    };

    analysis
        .points
        .iter()
        .scan(0.0, |prev, p| {
            if let Some(elapsed) = p.point.seconds_since(&first.point) {
                *prev = (elapsed * scale).max(0.0);
            }
            Some(*prev)
        })
        .collect()
}

/// Video times proportional to distance travelled.
fn distance_times(analysis: &TrackAnalysis, video_duration: f64) -> Vec<f64> {
    let total = analysis.total_distance_meters();
    analysis
        .points
        .iter()
        .map(|p| {
            if total > 0.0 {
                p.cumulative_distance_meters / total * video_duration
            } else {
                0.0
            }
        })
        .collect()
}

/// The point whose video time is closest to `query_time_seconds`.
///
/// Ties go to the earliest point.
pub fn point_at_time(
    synced: &[SynchronizedPoint],
    query_time_seconds: f64,
) -> Result<&SynchronizedPoint> {
    let mut iter = synced.iter();
    let mut closest = iter.next().ok_or(SyncError::EmptyTrack)?;
    let mut min_diff = (closest.video_time_seconds - query_time_seconds).abs();

    for p in iter {
        let diff = (p.video_time_seconds - query_time_seconds).abs();
        if diff < min_diff {
            min_diff = diff;
            closest = p;
        }
    }

    Ok(closest)
}

/// Synchronize the track and return the point closest to the query time.
pub fn point_at_time_for(
    analysis: &TrackAnalysis,
    query_time_seconds: f64,
    video_duration_seconds: f64,
    opts: &SyncOptions,
) -> Result<SynchronizedPoint> {
    let synced = synchronize(analysis, video_duration_seconds, opts)?;
    point_at_time(&synced, query_time_seconds).cloned()
}

/// The synchronized points for one video duration and option set, kept for
/// the playback queries that follow. Any change of either recomputes them.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    key: Option<(f64, SyncOptions)>,
    points: Vec<SynchronizedPoint>,
}

impl Timeline {
    pub fn points(
        &mut self,
        analysis: &TrackAnalysis,
        video_duration_seconds: f64,
        opts: &SyncOptions,
    ) -> Result<&[SynchronizedPoint]> {
        let current = matches!(
            &self.key,
            Some((duration, cached)) if duration.to_bits() == video_duration_seconds.to_bits() && cached == opts
        );
        if !current {
            self.points = synchronize(analysis, video_duration_seconds, opts)?;
            self.key = Some((video_duration_seconds, opts.clone()));
        }
        Ok(&self.points)
    }
}

/// Values shown in the player's live stats panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveReadout {
    pub latitude: f64,
    pub longitude: f64,
    pub video_time_seconds: f64,
    pub current_speed_kmh: f64,
    pub current_altitude_meters: f64,
    pub current_grade_percent: f64,
    pub distance_travelled_km: f64,
    pub total_distance_km: f64,
}

impl LiveReadout {
    pub fn at(
        analysis: &TrackAnalysis,
        query_time_seconds: f64,
        video_duration_seconds: f64,
        opts: &SyncOptions,
    ) -> Result<Self> {
        let p = point_at_time_for(analysis, query_time_seconds, video_duration_seconds, opts)?;
        Ok(Self::from_point(&p, analysis.statistics.total_distance_km))
    }

    pub fn from_point(p: &SynchronizedPoint, total_distance_km: f64) -> Self {
        Self {
            latitude: p.point.point.latitude,
            longitude: p.point.point.longitude,
            video_time_seconds: p.video_time_seconds,
            current_speed_kmh: p.point.instantaneous_speed_kmh,
            current_altitude_meters: p.point.point.elevation_or_default(),
            current_grade_percent: p.point.grade_percent,
            distance_travelled_km: p.point.cumulative_distance_meters / 1000.0,
            total_distance_km,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::analyze;
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    const T0: OffsetDateTime = datetime!(2025-01-01 6:00 UTC);

    fn timed_track(offsets: &[i64]) -> TrackAnalysis {
        let points: Vec<TrackPoint> = offsets
            .iter()
            .enumerate()
            .map(|(i, s)| {
                TrackPoint::new(35.0 + i as f64 * 0.001, 139.0, i)
                    .with_timestamp(T0 + Duration::seconds(*s))
            })
            .collect();
        analyze(&points)
    }

    fn untimed_track(n: usize) -> TrackAnalysis {
        let points: Vec<TrackPoint> = (0..n)
            .map(|i| TrackPoint::new(0.0, i as f64 * 0.001, i))
            .collect();
        analyze(&points)
    }

    #[test]
    fn test_timestamp_strategy_scales_to_video() {
        let analysis = timed_track(&[0, 30, 60, 90, 120]);
        assert_eq!(SyncStrategy::for_analysis(&analysis), SyncStrategy::Timestamp);

        let synced = synchronize(&analysis, 60.0, &SyncOptions::default()).unwrap();
        assert_eq!(synced.len(), 5);
        for p in &synced {
            assert!((0.0..=60.0).contains(&p.video_time_seconds));
        }
        assert!((synced[2].video_time_seconds - 30.0).abs() < 1e-9);
        assert!((synced[4].video_time_seconds - 60.0).abs() < 1e-9);
        assert!((synced[2].normalized_time - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_distance_strategy_without_timestamps() {
        let analysis = untimed_track(3);
        assert_eq!(SyncStrategy::for_analysis(&analysis), SyncStrategy::Distance);

        let synced = synchronize(&analysis, 90.0, &SyncOptions::default()).unwrap();
        let times: Vec<f64> = synced.iter().map(|p| p.video_time_seconds).collect();
        assert!((times[0] - 0.0).abs() < 1e-9);
        assert!((times[1] - 45.0).abs() < 1e-6);
        assert!((times[2] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_timestamps_fall_back_to_distance() {
        let analysis = timed_track(&[0, 0, 0]);
        assert_eq!(SyncStrategy::for_analysis(&analysis), SyncStrategy::Distance);

        let synced = synchronize(&analysis, 10.0, &SyncOptions::default()).unwrap();
        for p in &synced {
            assert!(p.video_time_seconds.is_finite());
            assert!(p.normalized_time.is_finite());
        }
        assert!((synced[2].video_time_seconds - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_distance_maps_to_start() {
        let points = vec![TrackPoint::new(1.0, 1.0, 0), TrackPoint::new(1.0, 1.0, 1)];
        let synced = synchronize(&analyze(&points), 30.0, &SyncOptions::default()).unwrap();
        assert!(synced.iter().all(|p| p.video_time_seconds == 0.0));
    }

    #[test]
    fn test_untimed_point_keeps_previous_time() {
        let mut points: Vec<TrackPoint> = timed_track(&[0, 10, 20])
            .points
            .into_iter()
            .map(|p| p.point)
            .collect();
        points[1].timestamp = None;
        let synced = synchronize(&analyze(&points), 20.0, &SyncOptions::default()).unwrap();
        assert_eq!(synced[1].video_time_seconds, 0.0);
        assert!((synced[2].video_time_seconds - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_output_length_and_idempotence() {
        let analysis = timed_track(&[0, 7, 19, 33, 41, 58]);
        let a = synchronize(&analysis, 37.5, &SyncOptions::default()).unwrap();
        let b = synchronize(&analysis, 37.5, &SyncOptions::default()).unwrap();
        assert_eq!(a.len(), analysis.points.len());
        assert_eq!(a, b);
    }

    #[test]
    fn test_real_time_truncation_drops_trailing_points() {
        let analysis = timed_track(&[0, 30, 60, 90, 120]);
        let synced = synchronize(&analysis, 60.0, &SyncOptions::trip_creation()).unwrap();
        let times: Vec<f64> = synced.iter().map(|p| p.video_time_seconds).collect();
        assert_eq!(times, vec![0.0, 30.0, 60.0]);
    }

    #[test]
    fn test_real_time_without_truncation_overruns() {
        let analysis = timed_track(&[0, 60, 120]);
        let opts = SyncOptions {
            time_scale: TimeScale::RealTime,
            ..Default::default()
        };
        let synced = synchronize(&analysis, 60.0, &opts).unwrap();
        assert_eq!(synced.len(), 3);
        assert!((synced[2].normalized_time - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_duration() {
        let analysis = untimed_track(2);
        for d in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                synchronize(&analysis, d, &SyncOptions::default()),
                Err(SyncError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn test_point_at_time_nearest() {
        let analysis = timed_track(&[0, 30, 60, 90, 120]);
        let synced = synchronize(&analysis, 120.0, &SyncOptions::default()).unwrap();
        assert_eq!(point_at_time(&synced, 44.0).unwrap().point.point.sequence_index, 1);
        assert_eq!(point_at_time(&synced, 46.0).unwrap().point.point.sequence_index, 2);
        assert_eq!(point_at_time(&synced, -10.0).unwrap().point.point.sequence_index, 0);
        assert_eq!(point_at_time(&synced, 500.0).unwrap().point.point.sequence_index, 4);
    }

    #[test]
    fn test_point_at_time_tie_goes_to_first() {
        let analysis = timed_track(&[0, 30, 60]);
        let synced = synchronize(&analysis, 60.0, &SyncOptions::default()).unwrap();
        // 15 s is equidistant from 0 and 30
        assert_eq!(point_at_time(&synced, 15.0).unwrap().point.point.sequence_index, 0);

        let stationary = synchronize(&untimed_track(1), 60.0, &SyncOptions::default()).unwrap();
        assert_eq!(point_at_time(&stationary, 30.0).unwrap().point.point.sequence_index, 0);
    }

    #[test]
    fn test_point_at_time_empty() {
        assert_eq!(point_at_time(&[], 3.0), Err(SyncError::EmptyTrack));

        let empty = analyze(&[]);
        assert!(synchronize(&empty, 10.0, &SyncOptions::default()).unwrap().is_empty());
        assert_eq!(
            point_at_time_for(&empty, 1.0, 10.0, &SyncOptions::default()),
            Err(SyncError::EmptyTrack)
        );
    }

    #[test]
    fn test_live_readout() {
        let analysis = timed_track(&[0, 60, 120]);
        let live = LiveReadout::at(&analysis, 31.0, 60.0, &SyncOptions::default()).unwrap();
        assert_eq!(live.video_time_seconds, 30.0);
        assert!((live.latitude - 35.001).abs() < 1e-12);
        assert!(live.current_speed_kmh > 0.0);
        assert!(live.distance_travelled_km < live.total_distance_km);
        assert!((live.total_distance_km - analysis.statistics.total_distance_km).abs() < 1e-12);
    }

    #[test]
    fn test_timeline_reuses_points_until_inputs_change() {
        let analysis = timed_track(&[0, 60, 120]);
        let mut timeline = Timeline::default();
        let stretch = SyncOptions::default();

        let first = timeline.points(&analysis, 60.0, &stretch).unwrap().as_ptr();
        let again = timeline.points(&analysis, 60.0, &stretch).unwrap();
        assert_eq!(again.as_ptr(), first);
        assert_eq!(again[2].video_time_seconds, 60.0);

        let longer = timeline.points(&analysis, 240.0, &stretch).unwrap();
        assert_eq!(longer[2].video_time_seconds, 240.0);

        let trip = SyncOptions::trip_creation();
        let truncated = timeline.points(&analysis, 90.0, &trip).unwrap();
        assert_eq!(truncated.len(), 2);
        assert_eq!(truncated[1].video_time_seconds, 60.0);
    }

    #[test]
    fn test_timeline_keeps_last_points_on_invalid_duration() {
        let analysis = timed_track(&[0, 60, 120]);
        let mut timeline = Timeline::default();
        let opts = SyncOptions::default();
        timeline.points(&analysis, 60.0, &opts).unwrap();

        assert_eq!(
            timeline.points(&analysis, -1.0, &opts).err(),
            Some(SyncError::InvalidDuration(-1.0))
        );
        let synced = timeline.points(&analysis, 60.0, &opts).unwrap();
        assert_eq!(synced.len(), 3);
        assert_eq!(point_at_time(synced, 29.0).unwrap().point.point.sequence_index, 1);
    }
}
