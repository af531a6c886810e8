use geojson::{Feature, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::stats::TrackAnalysis;
use crate::track_types::*;

/// Convert an analysed track to a GeoJSON Feature carrying its statistics.
///
/// Two or more points give a LineString, a single point gives a Point and an
/// empty track gives a Feature without geometry.
pub fn to_feature(name: &str, analysis: &TrackAnalysis) -> Feature {
    let with_ele = analysis.statistics.has_elevation;
    let geometry = match analysis.points.as_slice() {
        [] => None,
        [only] => Some(Geometry::new(Value::Point(point_coords(&only.point, with_ele)))),
        points => {
            let coords: Vec<Vec<f64>> = points
                .iter()
                .map(|p| point_coords(&p.point, with_ele))
                .collect();
            Some(Geometry::new(Value::LineString(coords)))
        }
    };

    let mut props = match serde_json::to_value(&analysis.statistics) {
        Ok(JsonValue::Object(map)) => map,
        _ => Map::new(),
    };
    props.insert("name".to_string(), JsonValue::String(name.to_string()));

    if analysis.points.iter().any(|p| p.point.timestamp.is_some()) {
        insert_coordinate_times(&mut props, &analysis.points);
    }

    Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Build [lon, lat] or [lon, lat, ele] coordinate array. The dimension is
/// chosen once per track; a point without `<ele>` gets 0.
fn point_coords(pt: &TrackPoint, with_ele: bool) -> Vec<f64> {
    if with_ele {
        vec![pt.longitude, pt.latitude, pt.elevation_or_default()]
    } else {
        vec![pt.longitude, pt.latitude]
    }
}

fn insert_coordinate_times(props: &mut Map<String, JsonValue>, points: &[EnrichedTrackPoint]) {
    let times: Vec<JsonValue> = points
        .iter()
        .map(|p| {
            p.point
                .timestamp
                .and_then(|t| t.format(&time::format_description::well_known::Rfc3339).ok())
                .map_or(JsonValue::Null, JsonValue::String)
        })
        .collect();

    let mut coord_props = Map::new();
    coord_props.insert("times".to_string(), JsonValue::Array(times));
    props.insert(
        "coordinateProperties".to_string(),
        JsonValue::Object(coord_props),
    );
}
