// Utility helpers for parsing and basic statistics.
//
// This module centralizes all the "dirty" CSV cell handling (free-text
// distances, clock-style durations, assorted date layouts) so the rest of the
// code can assume typed values. Every parser returns `None` instead of failing:
// an unknown value must stay distinguishable from zero.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a free-text distance such as `"123.4km"` or `"1,234 ｋｍ"`.
///
/// - Everything except ASCII digits and `'.'` is stripped first, so units,
///   thousands separators and stray spaces are tolerated.
/// - Returns `None` when nothing numeric is left or the remainder is not a
///   valid decimal (e.g. two dots).
/// - A minus sign ahead of the digits makes the cell invalid rather than
///   being stripped with the rest.
pub fn parse_distance(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let negative = s
        .chars()
        .take_while(|c| !c.is_ascii_digit())
        .any(|c| matches!(c, '-' | '－' | '−'));
    if negative {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Convert `"H:M"` or `"H:M:S"` into total minutes.
///
/// Seconds contribute a fractional minute (`"1:30:30"` is `90.5`). Any other
/// shape, including an empty cell, yields `None`.
pub fn parse_minutes(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let parts: Vec<u32> = s
        .split(':')
        .map(|t| t.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [h, m] => Some(f64::from(*h) * 60.0 + f64::from(*m)),
        [h, m, sec] => Some(f64::from(*h) * 60.0 + f64::from(*m) + f64::from(*sec) / 60.0),
        _ => None,
    }
}

const DATE_FORMATS: [&str; 4] = ["%Y/%m/%d", "%Y-%m-%d", "%Y年%m月%d日", "%Y%m%d"];

pub fn parse_date_lenient(s: Option<&str>) -> Option<NaiveDate> {
    // Exports sometimes append a time of day; only the first token matters.
    let s = s?.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Round to `decimals` places, ties to even (the rule pandas `round` applies).
pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round_ties_even() / factor
}

/// Divide, yielding `None` when the denominator is absent or not positive.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d <= 0.0 {
        return None;
    }
    let r = n / d;
    r.is_finite().then_some(r)
}

pub fn percentile(mut v: Vec<f64>, q: f64) -> Option<f64> {
    // Linear interpolation between closest ranks, the same convention
    // spreadsheet `PERCENTILE.INC` uses.
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(v[lo] + (v[hi] - v[lo]) * (pos - lo as f64))
}

/// Fixed decimals with thousands grouping, e.g. `1,234,567.89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = whole
        .parse::<u64>()
        .map(|v| v.to_formatted_string(&Locale::ja))
        .unwrap_or_else(|_| whole.to_string());
    // no "-0.00" for values that round to zero
    let sign = if n < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::ja)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_hour_minute() {
        assert_eq!(parse_minutes(Some("1:30")), Some(90.0));
    }

    #[test]
    fn test_minutes_with_seconds() {
        assert_eq!(parse_minutes(Some("1:30:30")), Some(90.5));
    }

    #[test]
    fn test_minutes_rejects_garbage() {
        assert_eq!(parse_minutes(Some("abc")), None);
        assert_eq!(parse_minutes(Some("")), None);
        assert_eq!(parse_minutes(None), None);
        assert_eq!(parse_minutes(Some("90")), None);
        assert_eq!(parse_minutes(Some("1:2:3:4")), None);
        assert_eq!(parse_minutes(Some("1:xx")), None);
        assert_eq!(parse_minutes(Some("-1:30")), None);
    }

    #[test]
    fn test_minutes_zero_is_a_value() {
        assert_eq!(parse_minutes(Some("0:00")), Some(0.0));
    }

    #[test]
    fn test_distance_strips_units() {
        assert_eq!(parse_distance(Some("123.4km")), Some(123.4));
        assert_eq!(parse_distance(Some("1,234 ｋｍ")), Some(1234.0));
        assert_eq!(parse_distance(Some(" 56 ")), Some(56.0));
    }

    #[test]
    fn test_distance_unparseable() {
        assert_eq!(parse_distance(Some("不明")), None);
        assert_eq!(parse_distance(Some("")), None);
        assert_eq!(parse_distance(Some("1.2.3")), None);
        assert_eq!(parse_distance(None), None);
    }

    #[test]
    fn test_distance_negative_is_invalid() {
        assert_eq!(parse_distance(Some("-12.5km")), None);
        assert_eq!(parse_distance(Some("km -3")), None);
        assert_eq!(parse_distance(Some("－40")), None);
        assert_eq!(parse_distance(Some("12-5")), Some(125.0));
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_date_lenient(Some("2024/03/05")), expected);
        assert_eq!(parse_date_lenient(Some("2024-03-05")), expected);
        assert_eq!(parse_date_lenient(Some("2024年3月5日")), expected);
        assert_eq!(parse_date_lenient(Some("2024/3/5 08:15")), expected);
        assert_eq!(parse_date_lenient(Some("昨日")), None);
        assert_eq!(parse_date_lenient(Some("  ")), None);
    }

    #[test]
    fn test_ratio_guards() {
        assert_eq!(ratio(Some(1.0), Some(0.0)), None);
        assert_eq!(ratio(Some(1.0), Some(-2.0)), None);
        assert_eq!(ratio(Some(1.0), None), None);
        assert_eq!(ratio(None, Some(2.0)), None);
        assert_eq!(ratio(Some(1.0), Some(4.0)), Some(0.25));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(28.571428, 2), 28.57);
        assert_eq!(round_to(4571.2, 0), 4571.0);
    }

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(4702.5, 0), 4702.0);
        // 0.125 and 0.375 are exact in binary, so these are true ties
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(vec![100.0, 300.0, 300.0], 0.75), Some(300.0));
        assert_eq!(percentile(vec![1.0, 2.0, 3.0, 4.0], 0.75), Some(3.25));
        assert_eq!(percentile(vec![], 0.75), None);
    }

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(12.0, 0), "12");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_int(9855), "9,855");
    }
}
