//! Human-readable time formatting
//!
//! Consistent time display for countdowns, log lines and the state API.

/// Format a countdown value the way the class timer shows it.
///
/// - Under an hour: `M:SS`
/// - An hour or more: `H:MM:SS`
///
/// # Examples
///
/// ```
/// use cadence_common::human_time::format_countdown;
///
/// assert_eq!(format_countdown(0), "0:00");
/// assert_eq!(format_countdown(75), "1:15");
/// assert_eq!(format_countdown(3725), "1:02:05");
/// ```
pub fn format_countdown(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Format a duration as compact words for summaries.
///
/// # Examples
///
/// ```
/// use cadence_common::human_time::format_duration_words;
///
/// assert_eq!(format_duration_words(45), "45s");
/// assert_eq!(format_duration_words(125), "2m 05s");
/// assert_eq!(format_duration_words(3720), "1h 02m");
/// ```
pub fn format_duration_words(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

/// Format milliseconds as seconds with one decimal, e.g. `2.5s`.
///
/// Used for timer and fade tracing where sub-second detail matters.
pub fn format_millis(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}
