//! Display formatting for process table cells.

/// Placeholder for a value that could not be read.
pub const NA: &str = "NA";

const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];

/// Human readable size with one decimal, e.g. `1536.0` becomes `"1.5K"`.
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() {
        return NA.to_string();
    }
    let mut value = bytes;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{:.1}{}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}P", value)
}

/// `MM:SS.S` for a number of seconds.
///
/// Rounds to the nearest tenth, ties to even, before splitting into minutes,
/// so `65.25` gives `"01:05.2"` and `59.96` gives `"01:00.0"`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return NA.to_string();
    }
    let tenths = (seconds * 10.0).round_ties_even() as u64;
    let minutes = tenths / 600;
    let rest = tenths % 600;
    format!("{:02}:{:02}.{}", minutes, rest / 10, rest % 10)
}

/// Percentages are shown with one decimal.
pub fn format_percent(value: f32) -> String {
    format!("{:.1}", value)
}

/// Keep at most `width` characters.
pub fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(format_bytes(0.0), "0.0B");
        assert_eq!(format_bytes(1023.0), "1023.0B");
        assert_eq!(format_bytes(1024.0), "1.0K");
        assert_eq!(format_bytes(1536.0), "1.5K");
        assert_eq!(format_bytes(5.0 * 1024.0 * 1024.0), "5.0M");
        assert_eq!(format_bytes(1024f64.powi(4)), "1.0T");
        assert_eq!(format_bytes(3.0 * 1024f64.powi(5)), "3.0P");
        assert_eq!(format_bytes(f64::NAN), NA);
    }

    #[test]
    fn time() {
        assert_eq!(format_time(0.0), "00:00.0");
        assert_eq!(format_time(125.4), "02:05.4");
        assert_eq!(format_time(65.25), "01:05.2");
        assert_eq!(format_time(59.96), "01:00.0");
        assert_eq!(format_time(6000.0), "100:00.0");
        assert_eq!(format_time(-1.0), NA);
        assert_eq!(format_time(f64::INFINITY), NA);
    }

    #[test]
    fn percent_and_truncate() {
        assert_eq!(format_percent(12.345), "12.3");
        assert_eq!(format_percent(0.0), "0.0");
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("ééé", 2), "éé");
    }
}
