//! Reports over stored sessions: totals, trends, and the daily goal.

pub mod goals;
pub mod stats;

pub use goals::{goal_progress, tracked_days, GoalProgress, TrackedDay};
pub use stats::{posture_history, posture_stats, HistoryPoint, PostureStats};

/// `"1h 2m 3s"`, or `"2m 3s"` under an hour.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else {
        format!("{minutes}m {secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_and_without_hours() {
        assert_eq!(format_duration(0), "0m 0s");
        assert_eq!(format_duration(123), "2m 3s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
    }
}
