use crate::error::{LnrError, Result};
use std::time::Duration;

/// Parse a duration string such as `0`, `45s`, `10m`, `1h30m` or `2d`.
///
/// A bare number is read as seconds. Units: `s`, `m`, `h`, `d`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    let invalid = |reason: &str| LnrError::InvalidSetting {
        key: "cache_ttl".to_string(),
        reason: format!("'{input}': {reason}"),
    };
    if s.is_empty() {
        return Err(invalid("empty duration"));
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(invalid("expected a number before each unit"));
        }
        let n: u64 = digits.parse().map_err(|_| invalid("number too large"))?;
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            other => return Err(invalid(&format!("unknown unit '{other}'"))),
        };
        total = n
            .checked_mul(unit)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| invalid("duration too large"))?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(invalid("missing unit after trailing number"));
    }
    Ok(Duration::from_secs(total))
}

/// Render a duration in the largest exact units, e.g. `1h30m`, `45s`, `0`.
pub fn format_duration(d: Duration) -> String {
    let mut secs = d.as_secs();
    if secs == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{unit}", secs / size));
            secs %= size;
        }
    }
    out
}
