//! Timestamp parsing and formatting for scene offsets.
//!
//! The search service labels scenes with `start_time` strings in a handful
//! of shapes ("0:01:41", "00:01:41.50", "1:41", "101"). Seeking needs plain
//! seconds, so everything funnels through `time_to_seconds`.

/// Convert a timestamp string to seconds.
///
/// Accepts `H:MM:SS`, `MM:SS`, fractional variants of either, and bare
/// seconds. Unparseable input falls back to the first number found in the
/// string, or 0.0 when there is none.
pub fn time_to_seconds(t: &str) -> f64 {
  let s = t.trim();
  if s.is_empty() {
    return 0.0;
  }

  // Bare seconds, possibly fractional.
  if let Ok(v) = s.parse::<f64>() {
    return v;
  }

  let parts: Vec<&str> = s.split(':').map(str::trim).filter(|p| !p.is_empty()).collect();
  let num = |p: &str| p.parse::<f64>().unwrap_or(0.0);
  match parts.len() {
    3 => num(parts[0]) * 3600.0 + num(parts[1]) * 60.0 + num(parts[2]),
    2 => num(parts[0]) * 60.0 + num(parts[1]),
    _ => first_number(s).unwrap_or(0.0),
  }
}

/// Format seconds as `H:MM:SS`, or `M:SS` under an hour.
pub fn format_seconds(sec: f64) -> String {
  let total = sec.max(0.0).round() as u64;
  let h = total / 3600;
  let m = (total % 3600) / 60;
  let s = total % 60;
  if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

/// First decimal number embedded in `s`, if any.
fn first_number(s: &str) -> Option<f64> {
  let start = s.find(|c: char| c.is_ascii_digit())?;
  let rest = &s[start..];
  let end = rest.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(rest.len());
  rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_h_mm_ss() {
    assert_eq!(time_to_seconds("0:01:41"), 101.0);
    assert_eq!(time_to_seconds("1:00:00"), 3600.0);
  }

  #[test]
  fn parses_fractional_seconds() {
    assert_eq!(time_to_seconds("00:01:41.50"), 101.5);
    assert_eq!(time_to_seconds("1:41.5"), 101.5);
  }

  #[test]
  fn parses_mm_ss() {
    assert_eq!(time_to_seconds("1:41"), 101.0);
  }

  #[test]
  fn parses_bare_seconds() {
    assert_eq!(time_to_seconds("101"), 101.0);
    assert_eq!(time_to_seconds("101.25"), 101.25);
  }

  #[test]
  fn empty_and_blank_are_zero() {
    assert_eq!(time_to_seconds(""), 0.0);
    assert_eq!(time_to_seconds("   "), 0.0);
  }

  #[test]
  fn falls_back_to_first_embedded_number() {
    assert_eq!(time_to_seconds("at 95s"), 95.0);
    assert_eq!(time_to_seconds("no digits"), 0.0);
  }

  #[test]
  fn formats_under_an_hour() {
    assert_eq!(format_seconds(101.0), "1:41");
    assert_eq!(format_seconds(5.0), "0:05");
  }

  #[test]
  fn formats_over_an_hour() {
    assert_eq!(format_seconds(3661.0), "1:01:01");
  }

  #[test]
  fn format_rounds_and_clamps() {
    assert_eq!(format_seconds(101.6), "1:42");
    assert_eq!(format_seconds(-3.0), "0:00");
  }
}
