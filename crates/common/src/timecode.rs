//! Timecode helpers for chapter markers and frame accounting.

/// Format seconds as a chapter timestamp.
///
/// `H:MM:SS` once the value reaches an hour (hours are not zero-padded),
/// otherwise `M:SS`. Fractional seconds are truncated; negative and
/// non-finite input formats as `0:00`.
pub fn format_timestamp(seconds: f64) -> String {
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

/// Number of whole frames covering `duration_secs` at `fps` (truncating).
pub fn frames_for(duration_secs: f64, fps: u32) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs * fps as f64).floor() as u64
}

/// Whole milliseconds in `secs`, as used by audio delay filters.
pub fn secs_to_millis(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * 1000.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_timestamp_minutes() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(5.0), "0:05");
        assert_eq!(format_timestamp(65.0), "1:05");
        assert_eq!(format_timestamp(599.9), "9:59");
    }

    #[test]
    fn test_format_timestamp_hours() {
        assert_eq!(format_timestamp(3600.0), "1:00:00");
        assert_eq!(format_timestamp(3661.0), "1:01:01");
        assert_eq!(format_timestamp(36_000.0 + 59.0), "10:00:59");
    }

    #[test]
    fn test_format_timestamp_degenerate_input() {
        assert_eq!(format_timestamp(-3.0), "0:00");
        assert_eq!(format_timestamp(f64::NAN), "0:00");
    }

    #[test]
    fn test_frames_for_truncates() {
        assert_eq!(frames_for(2.0, 30), 60);
        assert_eq!(frames_for(2.03, 30), 60);
        assert_eq!(frames_for(0.0, 30), 0);
        assert_eq!(frames_for(-1.0, 30), 0);
    }

    #[test]
    fn test_secs_to_millis() {
        assert_eq!(secs_to_millis(0.5), 500);
        assert_eq!(secs_to_millis(1.25), 1250);
        assert_eq!(secs_to_millis(0.0), 0);
    }

    proptest! {
        #[test]
        fn prop_format_timestamp_never_pads_leading_unit(secs in 0u64..200_000) {
            let stamp = format_timestamp(secs as f64);
            prop_assert!(!stamp.starts_with('0') || secs < 60);
            let parts = stamp.split(':').count();
            prop_assert_eq!(parts, if secs >= 3600 { 3 } else { 2 });
        }
    }
}
