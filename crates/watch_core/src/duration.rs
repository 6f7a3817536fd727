//! Human-readable durations for chat output.

/// Formats a second count as `"<m>m <s>s"` below one hour and `"<h>h <m>m"`
/// from one hour upwards. Seconds are dropped once hours are shown.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}
