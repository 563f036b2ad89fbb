//! Text rendering shared by every display value.

use chrono::{Local, TimeZone};

/// Renders a coordinate or distance the way the displays show it: shortest
/// round-trip form, always with a fractional part (`100.0`, `34.05`).
pub fn number(v: f64) -> String {
    format!("{v:?}")
}

/// Local wall-clock time of an epoch-millis timestamp as `HH:MM:SS`.
pub fn clock_time(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).single() {
        Some(t) => t.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keeps_fraction() {
        assert_eq!(number(100.0), "100.0");
        assert_eq!(number(34.05), "34.05");
        assert_eq!(number(-118.25), "-118.25");
        assert_eq!(number(0.0), "0.0");
    }

    #[test]
    fn clock_time_is_hh_mm_ss() {
        let s = clock_time(1_700_000_000_000);
        assert_eq!(s.len(), 8);
        let parts: Vec<_> = s.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn clock_time_ignores_sub_second() {
        assert_eq!(clock_time(1_700_000_000_000), clock_time(1_700_000_000_999));
    }
}
