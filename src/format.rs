//! Display strings for the player's stat readouts.

/// `H:MM:SS` for an hour or more, otherwise `M:SS`. Negative input is shown as 0.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Meters below one kilometer, otherwise kilometers with two decimals.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", whole(km * 1000.0))
    } else {
        format!("{km:.2} km")
    }
}

pub fn format_speed(kmh: f64) -> String {
    format!("{kmh:.1} km/h")
}

pub fn format_elevation(meters: f64) -> String {
    format!("{} m", whole(meters))
}

/// Rounded to an integer, with `-0` shown as `0`.
fn whole(value: f64) -> f64 {
    value.round() + 0.0
}
