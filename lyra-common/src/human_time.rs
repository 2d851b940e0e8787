//! Human-readable duration formatting for progress and summary lines
//!
//! Format is chosen by magnitude:
//! - `< 100s`  → `X.Xs`
//! - `< 100m`  → `M:SS`
//! - otherwise → `H:MM:SS`

const SHORT_FORMAT_MAX: f64 = 100.0;
const MEDIUM_FORMAT_MAX: f64 = 6000.0;

/// Format a duration given in (possibly fractional) seconds
///
/// Negative and non-finite inputs are clamped to zero; an ETA can briefly go
/// negative when the batch estimate undercounts.
///
/// ```
/// use lyra_common::human_time::format_duration_secs;
///
/// assert_eq!(format_duration_secs(4.0), "4.0s");
/// assert_eq!(format_duration_secs(330.0), "5:30");
/// assert_eq!(format_duration_secs(7322.0), "2:02:02");
/// ```
pub fn format_duration_secs(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };

    if seconds < SHORT_FORMAT_MAX {
        return format!("{:.1}s", seconds);
    }

    let whole = seconds.round() as u64;
    if seconds < MEDIUM_FORMAT_MAX {
        format!("{}:{:02}", whole / 60, whole % 60)
    } else {
        format!("{}:{:02}:{:02}", whole / 3600, (whole % 3600) / 60, whole % 60)
    }
}
