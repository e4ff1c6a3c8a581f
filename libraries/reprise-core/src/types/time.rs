//! Time values and the clamping rule shared by engine and coordinator.

/// Clamp a playback time against an optional known duration.
///
/// With a positive duration the result lies in `[0, duration]`. Without one
/// only the lower bound applies. NaN collapses to `0`.
#[must_use]
pub fn clamp_time(time: f64, duration: Option<f64>) -> f64 {
    if time.is_nan() {
        return 0.0;
    }
    let floor = time.max(0.0);
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => floor.min(d),
        _ => floor,
    }
}

/// Format seconds as `m:ss.t` (or `h:mm:ss.t` past an hour).
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    let tenths = (clamp_time(seconds, None) * 10.0).round() as u64;
    let total_secs = tenths / 10;
    let frac = tenths % 10;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}.{frac}")
    } else {
        format!("{minutes}:{secs:02}.{frac}")
    }
}
