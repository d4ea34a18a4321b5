//! Display helpers of the mini player

/// Renders a position as `m:ss`
///
/// Minutes are not wrapped into hours: 3725 seconds is `62:05`. Negative and
/// non-finite values render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Progress bar fill in percent, 0 while the duration is unknown
pub fn progress_percent(current_time: f64, duration: f64) -> f64 {
    if duration.is_nan() || duration <= 0.0 || !current_time.is_finite() {
        return 0.0;
    }
    (current_time / duration * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.9), "0:05");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(3725.4), "62:05");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(30.0, 120.0), 25.0);
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
        assert_eq!(progress_percent(200.0, 100.0), 100.0);
        assert_eq!(progress_percent(10.0, f64::NAN), 0.0);
    }
}
