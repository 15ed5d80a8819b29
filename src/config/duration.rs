//! Interval parsing utilities.

use anyhow::Context;
use std::time::Duration;

/// Parse an interval like "250ms", "1.5s", "2m", "1h" or "0.5" into a `Duration`.
/// Supports:
/// - Plain numbers (interpreted as seconds, fractions allowed): "0.5"
/// - Milliseconds suffix: "250ms"
/// - Seconds suffix: "1.5s"
/// - Minutes suffix: "2m"
/// - Hours suffix: "1h"
pub fn parse_interval(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty interval string");
    }

    // "ms" must be checked before "m" and "s"
    let (num_str, secs_per_unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, None)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, Some(3600.0))
    } else if let Some(n) = s.strip_suffix('m') {
        (n, Some(60.0))
    } else if let Some(n) = s.strip_suffix('s') {
        (n, Some(1.0))
    } else {
        (s, Some(1.0))
    };

    let value: f64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid interval value: {s}"))?;
    if !value.is_finite() || value < 0.0 {
        anyhow::bail!("Interval must be a non-negative number: {s}");
    }

    let secs = match secs_per_unit {
        Some(scale) => value * scale,
        None => value / 1000.0,
    };
    Duration::try_from_secs_f64(secs).with_context(|| format!("Interval out of range: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_units() {
        assert_eq!(parse_interval("1").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_interval("0.5").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_interval("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_interval("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_interval("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_interval("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_interval(" 0 ").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_interval_rejects_garbage() {
        assert!(parse_interval("").is_err());
        assert!(parse_interval("abc").is_err());
        assert!(parse_interval("-1s").is_err());
        assert!(parse_interval("1d").is_err());
        assert!(parse_interval("1e20").is_err());
        assert!(parse_interval("1e20h").is_err());
    }
}
