use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::ParseError;
use crate::track_types::*;

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a GPX XML string into the ordered track points of all its tracks.
///
/// Every `<trkpt>` of every `<trk>`/`<trkseg>` is returned in document order.
/// The name is taken from the first `<trk>` that has one.
pub fn parse_track(xml: &str) -> Result<ParsedTrack> {
    let mut reader = Reader::from_str(xml);
    let mut name: Option<String> = None;
    let mut metadata: Option<TrackMetadata> = None;
    let mut points: Vec<TrackPoint> = Vec::new();
    let mut open: Vec<Vec<u8>> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trk" => {
                    let trk_name = parse_trk(&mut reader, &mut points)?;
                    if name.is_none() {
                        name = trk_name;
                    }
                }
                b"metadata" => metadata = Some(parse_metadata(&mut reader)?),
                b"wpt" | b"rte" | b"extensions" => {
                    reader.read_to_end(e.name())?;
                }
                _ => open.push(e.name().0.to_vec()),
            },
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::XmlParse(e)),
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(ParseError::UnexpectedEof {
            element: String::from_utf8_lossy(&unclosed).into_owned(),
        });
    }

    if points.is_empty() {
        return Err(ParseError::NoTrackPoints);
    }

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNNAMED_TRACK.to_string());

    log::debug!("parsed {} track points from '{}'", points.len(), name);

    Ok(ParsedTrack {
        name,
        metadata,
        points,
    })
}

/// Read a GPX file from disk and parse it.
#[cfg(not(target_arch = "wasm32"))]
pub fn parse_track_file(path: impl AsRef<std::path::Path>) -> Result<ParsedTrack> {
    let xml = std::fs::read_to_string(path.as_ref())?;
    parse_track(&xml)
}

/// Parse a <metadata> element. A `<time>` that cannot be read is dropped
/// rather than failing the track.
fn parse_metadata<'a>(reader: &mut Reader<&'a [u8]>) -> Result<TrackMetadata> {
    let mut metadata = TrackMetadata::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"author" => metadata.author = parse_author(reader, &e)?,
                b"link" => {
                    metadata.link = link_href(&e);
                    reader.read_to_end(e.name())?;
                }
                b"time" => {
                    let text = read_text_owned(reader, &e)?;
                    metadata.time = match parse_datetime(&text) {
                        Ok(t) => Some(t),
                        Err(err) => {
                            log::warn!("ignoring metadata time '{}': {}", text.trim(), err);
                            None
                        }
                    };
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"link" => {
                metadata.link = link_href(&e);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"metadata" => break,
            Ok(Event::Eof) => return Err(unexpected_eof("metadata")),
            Err(e) => return Err(ParseError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(metadata)
}

/// The `<name>` of an `<author>` element.
fn parse_author<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'a>,
) -> Result<Option<String>> {
    let end_name = start.name().0.to_vec();
    let mut name: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"name" => {
                name = Some(read_text_owned(reader, &e)?);
            }
            Ok(Event::Start(e)) => {
                reader.read_to_end(e.name())?;
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(unexpected_eof("author")),
            Err(e) => return Err(ParseError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()))
}

fn link_href(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"href")
        .map(|attr| String::from_utf8_lossy(&attr.value).trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Parse a <trk> element, appending its points. Returns the track name.
fn parse_trk<'a>(
    reader: &mut Reader<&'a [u8]>,
    points: &mut Vec<TrackPoint>,
) -> Result<Option<String>> {
    let mut name: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => name = Some(read_text_owned(reader, &e)?),
                b"trkseg" => parse_segment(reader, points)?,
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => return Err(unexpected_eof("trk")),
            Err(e) => return Err(ParseError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(name)
}

/// Parse a <trkseg> element, appending its points.
fn parse_segment<'a>(reader: &mut Reader<&'a [u8]>, points: &mut Vec<TrackPoint>) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    let pt = parse_point(&e, reader, points.len())?;
                    points.push(pt);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    let index = points.len();
                    let (lat, lon) = parse_lat_lon(&e, index)?;
                    points.push(TrackPoint::new(lat, lon, index));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => return Err(unexpected_eof("trkseg")),
            Err(e) => return Err(ParseError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(())
}

/// Parse lat/lon attributes from a <trkpt> start tag.
fn parse_lat_lon(e: &BytesStart<'_>, index: usize) -> Result<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| ParseError::XmlParse(e.into()))?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(parse_coordinate(val, "lat", index)?),
            b"lon" => lon = Some(parse_coordinate(val, "lon", index)?),
            _ => {}
        }
    }

    let lat = lat.ok_or(ParseError::MissingAttribute {
        element: "trkpt",
        attribute: "lat",
        index,
    })?;
    let lon = lon.ok_or(ParseError::MissingAttribute {
        element: "trkpt",
        attribute: "lon",
        index,
    })?;

    Ok((lat, lon))
}

fn parse_coordinate(val: &str, attribute: &'static str, index: usize) -> Result<f64> {
    match val.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidAttribute {
            element: "trkpt",
            attribute,
            value: val.to_string(),
            index,
        }),
    }
}

/// Parse a <trkpt> element and its children.
/// Called after receiving Event::Start for the point element.
fn parse_point<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    index: usize,
) -> Result<TrackPoint> {
    let (lat, lon) = parse_lat_lon(start, index)?;
    let mut point = TrackPoint::new(lat, lon, index);
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"ele" => {
                    let text = read_text_owned(reader, &e)?;
                    point.elevation = Some(parse_elevation(&text, index)?);
                }
                b"time" => {
                    let text = read_text_owned(reader, &e)?;
                    point.timestamp = Some(parse_timestamp(&text, index)?);
                }
                _ => {
                    // extensions, hdop, sat, ...
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(unexpected_eof("trkpt")),
            Err(e) => return Err(ParseError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(point)
}

fn parse_elevation(text: &str, index: usize) -> Result<f64> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidElevation {
            value: text.to_string(),
            index,
        }),
    }
}

fn parse_timestamp(text: &str, index: usize) -> Result<OffsetDateTime> {
    parse_datetime(text).map_err(|source| ParseError::InvalidTimestamp {
        value: text.trim().to_string(),
        index,
        source,
    })
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM:SS` taken as UTC.
fn parse_datetime(text: &str) -> std::result::Result<OffsetDateTime, time::error::Parse> {
    let text = text.trim();
    OffsetDateTime::parse(text, &Rfc3339).or_else(|source| {
        let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
        PrimitiveDateTime::parse(text, naive)
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|_| source)
    })
}

fn unexpected_eof(element: &str) -> ParseError {
    ParseError::UnexpectedEof {
        element: element.to_string(),
    }
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(raw);
            }
            Ok(Event::CData(e)) => {
                let s = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(s);
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => {
                return Err(unexpected_eof(&String::from_utf8_lossy(&end_name)));
            }
            Err(e) => return Err(ParseError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text)
}
