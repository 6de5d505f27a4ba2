// Parsing and formatting helpers plus basic statistics.
//
// Spreadsheet cells arrive loosely typed; everything here turns them into
// clean numbers, and turns numbers back into German-formatted text.
use crate::types::CellValue;
use num_format::{Locale, ToFormattedString};

/// Parse an age out of a cell.
///
/// - Integer cells are taken as is.
/// - Float cells (xlsx stores every number as float) are floored, so that
///   `74.9` still lands in the 70-74 range.
/// - Text is trimmed and parsed as integer, then as float.
/// - Anything else yields `None`.
pub fn parse_age(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Int(v) => Some(*v),
        CellValue::Float(v) if v.is_finite() => Some(v.floor() as i64),
        CellValue::Text(s) => parse_i64_safe(Some(s.as_str())).or_else(|| {
            parse_f64_safe(Some(s.as_str()))
                .filter(|v| v.is_finite())
                .map(|v| v.floor() as i64)
        }),
        _ => None,
    }
}

pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

/// Accepts both `81.5` and the German `81,5`.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    s.replace(',', ".").parse::<f64>().ok()
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn median(mut v: Vec<f64>) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        v[mid]
    } else {
        (v[mid - 1] + v[mid]) / 2.0
    }
}

/// Fixed decimals with German separators, e.g. `1.234,5`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::de);
    if let Some(frac) = frac_part {
        res.push(',');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// One-decimal percentage, e.g. `33,3 %`.
pub fn format_percent(p: f64) -> String {
    format!("{} %", format_number(p, 1))
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::de)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_age_variants() {
        assert_eq!(parse_age(&CellValue::Int(81)), Some(81));
        assert_eq!(parse_age(&CellValue::Float(74.9)), Some(74));
        assert_eq!(parse_age(&CellValue::Text(" 90 ".to_string())), Some(90));
        assert_eq!(parse_age(&CellValue::Text("88,0".to_string())), Some(88));
        assert_eq!(parse_age(&CellValue::Text("unbekannt".to_string())), None);
        assert_eq!(parse_age(&CellValue::Empty), None);
        assert_eq!(parse_age(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_average_and_median() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[70.0, 80.0, 90.0]), 80.0);
        assert_eq!(median(vec![]), 0.0);
        assert_eq!(median(vec![91.0, 70.0, 80.0]), 80.0);
        assert_eq!(median(vec![70.0, 80.0, 90.0, 100.0]), 85.0);
    }

    #[test]
    fn test_german_formatting() {
        assert_eq!(format_number(1234.5, 1), "1.234,5");
        assert_eq!(format_number(-2.25, 2), "-2,25");
        assert_eq!(format_number(7.0, 0), "7");
        assert_eq!(format_percent(100.0 / 3.0), "33,3 %");
        assert_eq!(format_int(12345usize), "12.345");
    }

    #[test]
    fn test_exact_halves_round_to_even() {
        assert_eq!(format_number(84.25, 1), "84,2");
        assert_eq!(format_number(84.26, 1), "84,3");
    }
}
