#![cfg(not(target_arch = "wasm32"))]

use gpx_tour_sync::error::{ParseError, SyncError};
use gpx_tour_sync::options::SyncOptions;
use gpx_tour_sync::parser::{parse_track, parse_track_file};
use gpx_tour_sync::report::{TourStatsRecord, TrackReport};
use gpx_tour_sync::stats::{TrackAnalysis, analyze};
use gpx_tour_sync::sync::{SyncStrategy, point_at_time, synchronize};

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn analyze_fixture(path: &str) -> TrackAnalysis {
    let track = parse_track(&load_fixture(path)).unwrap();
    analyze(&track.points)
}

// ---- basic/ ----

#[test]
fn test_01_timed_track_statistics() {
    let track = parse_track(&load_fixture("basic/01_timed_track.gpx")).unwrap();
    assert_eq!(track.name, "Harbour Loop");
    assert_eq!(track.points.len(), 5);

    let metadata = track.metadata.as_ref().unwrap();
    assert_eq!(metadata.author.as_deref(), Some("Maqz"));
    assert_eq!(metadata.link.as_deref(), Some("https://example.com/tours/shiba"));
    assert!(metadata.time.is_some());

    let s = analyze(&track.points).statistics;
    assert!((s.total_distance_km - 0.483188).abs() < 1e-5);
    assert_eq!(s.total_duration_seconds, 120.0);
    assert_eq!(s.elevation_gain_meters, 11.0);
    assert_eq!(s.elevation_loss_meters, 9.0);
    assert_eq!(s.max_altitude_meters, 31.0);
    assert_eq!(s.min_altitude_meters, 20.0);
    assert!((s.max_speed_kmh - 15.147869).abs() < 1e-4);
    assert!((s.average_speed_kmh - 14.495626).abs() < 1e-4);
    assert!(s.has_elevation && s.has_timestamps);
}

#[test]
fn test_01_playback_sync() {
    let analysis = analyze_fixture("basic/01_timed_track.gpx");
    assert_eq!(SyncStrategy::for_analysis(&analysis), SyncStrategy::Timestamp);

    // 120 s of recording over a 60 s video
    let synced = synchronize(&analysis, 60.0, &SyncOptions::default()).unwrap();
    assert_eq!(synced.len(), 5);
    let times: Vec<f64> = synced.iter().map(|p| p.video_time_seconds).collect();
    assert_eq!(times, vec![0.0, 15.0, 30.0, 45.0, 60.0]);

    let p = point_at_time(&synced, 29.0).unwrap();
    assert_eq!(p.point.point.sequence_index, 2);
    assert_eq!(p.point.point.elevation, Some(31.0));
}

#[test]
fn test_01_trip_creation_truncates() {
    let analysis = analyze_fixture("basic/01_timed_track.gpx");
    let synced = synchronize(&analysis, 60.0, &SyncOptions::trip_creation()).unwrap();
    let indices: Vec<usize> = synced.iter().map(|p| p.point.point.sequence_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(synced.iter().all(|p| p.video_time_seconds <= 60.0));
}

#[test]
fn test_02_untimed_track_distributes_by_distance() {
    let analysis = analyze_fixture("basic/02_untimed_track.gpx");
    assert_eq!(SyncStrategy::for_analysis(&analysis), SyncStrategy::Distance);
    assert_eq!(analysis.statistics.total_duration_seconds, 0.0);
    assert_eq!(analysis.statistics.average_speed_kmh, 0.0);

    let synced = synchronize(&analysis, 90.0, &SyncOptions::default()).unwrap();
    assert!((synced[0].video_time_seconds - 0.0).abs() < 1e-9);
    assert!((synced[1].video_time_seconds - 45.0).abs() < 1e-6);
    assert!((synced[2].video_time_seconds - 90.0).abs() < 1e-9);
    assert!((synced[1].normalized_time - 0.5).abs() < 1e-8);
}

#[test]
fn test_03_multi_segment_is_one_sequence() {
    let track = parse_track(&load_fixture("basic/03_multi_segment.gpx")).unwrap();
    assert_eq!(track.name, "Col Ride");
    assert_eq!(track.points.len(), 4);
    let indices: Vec<usize> = track.points.iter().map(|p| p.sequence_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    let s = analyze(&track.points).statistics;
    assert_eq!(s.total_duration_seconds, 320.0);
    assert_eq!(s.elevation_gain_meters, 25.0);
    assert_eq!(s.elevation_loss_meters, 7.0);
}

// ---- edge/ ----

#[test]
fn test_04_no_points() {
    let result = parse_track(&load_fixture("edge/04_no_points.gpx"));
    assert!(matches!(result, Err(ParseError::NoTrackPoints)));
}

#[test]
fn test_05_malformed() {
    let result = parse_track(&load_fixture("edge/05_malformed.gpx"));
    assert!(matches!(result, Err(ParseError::XmlParse(_))));
}

#[test]
fn test_06_single_point() {
    let analysis = analyze_fixture("edge/06_single_point.gpx");
    let s = &analysis.statistics;
    assert_eq!(s.point_count, 1);
    assert_eq!(s.total_distance_km, 0.0);
    assert_eq!(s.max_altitude_meters, 0.0);

    let synced = synchronize(&analysis, 30.0, &SyncOptions::default()).unwrap();
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0].video_time_seconds, 0.0);
    assert_eq!(point_at_time(&synced, 12.0).unwrap().point.point.sequence_index, 0);
}

#[test]
fn test_07_invalid_latitude() {
    match parse_track(&load_fixture("edge/07_invalid_lat.gpx")) {
        Err(ParseError::InvalidAttribute { value, index, .. }) => {
            assert_eq!(value, "35,001");
            assert_eq!(index, 1);
        }
        other => panic!("expected InvalidAttribute, got {other:?}"),
    }
}

#[test]
fn test_08_same_timestamps_fall_back() {
    let analysis = analyze_fixture("edge/08_same_timestamps.gpx");
    assert_eq!(SyncStrategy::for_analysis(&analysis), SyncStrategy::Distance);
    assert_eq!(analysis.statistics.max_speed_kmh, 0.0);

    let synced = synchronize(&analysis, 10.0, &SyncOptions::default()).unwrap();
    for p in &synced {
        assert!(p.video_time_seconds.is_finite());
        assert!((0.0..=10.0).contains(&p.video_time_seconds));
    }
}

#[test]
fn test_missing_file() {
    let result = parse_track_file("tests/fixtures/does_not_exist.gpx");
    assert!(matches!(result, Err(ParseError::Io(_))));
}

#[test]
fn test_tour_creation_flow() {
    let track = parse_track_file("tests/fixtures/basic/01_timed_track.gpx").unwrap();
    let stats = analyze(&track.points).statistics;
    let record = TourStatsRecord::from(&stats);
    assert_eq!(record.duration_seconds, 120.0);
    assert_eq!(record.max_altitude, 31.0);

    let json = serde_json::to_value(&record).unwrap();
    assert!(json.get("distance_km").is_some());
    assert!(json.get("elevation_gain").is_some());
}

#[test]
fn test_report_without_video_duration() {
    let track = parse_track(&load_fixture("basic/02_untimed_track.gpx")).unwrap();
    let report = TrackReport::build(&track, None);
    assert!(report.synchronized.is_none());
    assert_eq!(report.points.len(), 3);
    assert_eq!(report.statistics.duration, 0.0);
    assert!(report.metadata.is_none());
}

#[test]
fn test_empty_synchronized_set_has_no_point() {
    let analysis = analyze(&[]);
    let synced = synchronize(&analysis, 10.0, &SyncOptions::default()).unwrap();
    assert_eq!(point_at_time(&synced, 0.0), Err(SyncError::EmptyTrack));
}
