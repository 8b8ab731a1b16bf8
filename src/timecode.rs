//! Decoding of `"H:MM"` duration text into decimal hours.
//!
//! Both maintenance labor fields and utilization flight hours arrive as
//! clock-style text. A column is decoded as a whole: when most of its values
//! carry no `:` separator it is treated as already numeric.

/// Parses a numeric sub-part, treating anything unparsable (or NaN) as zero.
fn part_or_zero(part: Option<&str>) -> f64 {
    part.and_then(parse_number).unwrap_or(0.0)
}

/// Lenient numeric coercion. Returns `None` for blanks, garbage and NaN.
pub fn parse_number(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    if value.is_nan() { None } else { Some(value) }
}

/// Decodes a single `"H:MM"` value into decimal hours.
///
/// Extra parts (`"H:MM:SS"`) are ignored. The minute term is kept as
/// `(m * 100 / 60) / 100` so results match historical labels bit for bit.
pub fn decode_duration(text: &str) -> f64 {
    let mut parts = text.split(':');
    let hours = part_or_zero(parts.next());
    let minutes = part_or_zero(parts.next());
    hours + (minutes * 100.0 / 60.0) / 100.0
}

/// Blank cells and the `"nan"` placeholder for missing values.
fn is_missing(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.eq_ignore_ascii_case("nan")
}

/// Returns true when the column should be read as `"H:MM"` text.
///
/// Missing values do not vote, so a sparse clock column stays a clock column.
fn is_clock_column<S: AsRef<str>>(values: &[S]) -> bool {
    let (present, plain) = values
        .iter()
        .map(|v| v.as_ref())
        .filter(|v| !is_missing(v))
        .fold((0usize, 0usize), |(present, plain), v| {
            (present + 1, plain + usize::from(!v.contains(':')))
        });
    plain * 2 <= present
}

/// Decodes a whole column.
///
/// Clock-formatted columns always produce a value; numeric columns yield
/// `None` where a value cannot be coerced.
pub fn decode_column<S: AsRef<str>>(values: &[S]) -> Vec<Option<f64>> {
    if values.is_empty() {
        return Vec::new();
    }
    if is_clock_column(values) {
        values
            .iter()
            .map(|v| Some(decode_duration(v.as_ref())))
            .collect()
    } else {
        values.iter().map(|v| parse_number(v.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decode_duration_hours_and_minutes() {
        for (h, m) in [(0u32, 0u32), (2, 30), (1, 15), (12, 59), (143, 7)] {
            let text = format!("{}:{:02}", h, m);
            assert!(close(decode_duration(&text), h as f64 + m as f64 / 60.0), "{text}");
        }
    }

    #[test]
    fn test_decode_duration_matches_legacy_formula_exactly() {
        let expected = 3.0 + (20.0 * 100.0 / 60.0) / 100.0;
        assert_eq!(decode_duration("3:20"), expected);
    }

    #[test]
    fn test_decode_duration_ignores_seconds() {
        assert_eq!(decode_duration("02:30:00"), 2.5);
    }

    #[test]
    fn test_decode_duration_garbage_parts_are_zero() {
        assert_eq!(decode_duration("x:30"), 0.5);
        assert_eq!(decode_duration("4:"), 4.0);
        assert_eq!(decode_duration("nan"), 0.0);
        assert_eq!(decode_duration("7"), 7.0);
    }

    #[test]
    fn test_decode_column_clock() {
        let decoded = decode_column(&["1:30", "0:45", "nan"]);
        assert_eq!(decoded, vec![Some(1.5), Some(0.75), Some(0.0)]);
    }

    #[test]
    fn test_decode_column_numeric_passthrough() {
        let decoded = decode_column(&["1.5", "2", "abc", "0:30"]);
        assert_eq!(decoded, vec![Some(1.5), Some(2.0), None, None]);
    }

    #[test]
    fn test_decode_column_sparse_clock_values() {
        let decoded = decode_column(&["nan", "", "nan", "2:30"]);
        assert_eq!(decoded, vec![Some(0.0), Some(0.0), Some(0.0), Some(2.5)]);
    }

    #[test]
    fn test_decode_column_sparse_numeric_values() {
        let decoded = decode_column(&["nan", "nan", "nan", "1.5", "2"]);
        assert_eq!(decoded, vec![None, None, None, Some(1.5), Some(2.0)]);
    }

    #[test]
    fn test_decode_column_all_missing() {
        assert_eq!(decode_column(&["nan", " "]), vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_decode_column_empty() {
        let empty: [&str; 0] = [];
        assert!(decode_column(&empty).is_empty());
    }
}
