//! Field parsing helpers shared by providers.

use chrono::{NaiveDate, NaiveDateTime};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;

use crate::errors::ProviderError;
use crate::models::{DividendRecord, Symbol};

/// Date formats seen across providers, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%m-%d-%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Decimal places kept when converting provider floats.
const AMOUNT_SCALE: u32 = 6;

/// Re-check that a symbol is in canonical form before it goes on the wire.
pub fn validate_symbol(provider: &str, symbol: &Symbol) -> Result<(), ProviderError> {
    match Symbol::parse(symbol.as_str()) {
        Ok(reparsed) if reparsed == *symbol => Ok(()),
        Ok(_) => Err(ProviderError::InvalidSymbol(format!(
            "{}: '{}' is not canonical",
            provider, symbol
        ))),
        Err(e) => Err(ProviderError::InvalidSymbol(format!("{}: {}", provider, e))),
    }
}

/// Parse a date string in any of the known formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim().replace('.', "");
    if cleaned.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&cleaned, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse an amount such as "$1,234.50" or "0.24".
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Convert a provider float into a decimal amount.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.round_dp(AMOUNT_SCALE).normalize())
}

/// Infer a frequency label from the spacing of ex-dates.
///
/// Expects records sorted most-recent-first. Needs at least two dated records.
pub fn infer_frequency(records: &[DividendRecord]) -> Option<&'static str> {
    let intervals: Vec<i64> = records
        .windows(2)
        .filter_map(|pair| match (pair[0].ex_date, pair[1].ex_date) {
            (Some(newer), Some(older)) => Some((newer - older).num_days()),
            _ => None,
        })
        .collect();

    if intervals.is_empty() {
        return None;
    }

    let average = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

    let label = match average {
        a if (25.0..=35.0).contains(&a) => "monthly",
        a if (80.0..=100.0).contains(&a) => "quarterly",
        a if (160.0..=200.0).contains(&a) => "semi-annual",
        a if (350.0..=380.0).contains(&a) => "annual",
        _ => "irregular",
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dated(y: i32, m: u32, d: u32) -> DividendRecord {
        DividendRecord::regular(
            "TEST",
            "test",
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            dec!(1),
        )
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 9);
        assert_eq!(parse_date("2024-02-09"), expected);
        assert_eq!(parse_date("02/09/2024"), expected);
        assert_eq!(parse_date("Feb 9, 2024"), expected);
        assert_eq!(parse_date("February 9, 2024"), expected);
        assert_eq!(parse_date("Feb. 9, 2024"), expected);
        assert_eq!(parse_date("Feb 9 2024"), expected);
        assert_eq!(parse_date("02-09-2024"), expected);
        assert_eq!(parse_date("2024-02-09 16:00:00"), expected);
    }

    #[test]
    fn test_parse_date_day_first_fallback() {
        // Not a valid month/day, so the day-first format applies
        assert_eq!(
            parse_date("25/12/2023"),
            NaiveDate::from_ymd_opt(2023, 12, 25)
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("N/A"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$0.24"), Some(dec!(0.24)));
        assert_eq!(parse_amount(" 1,234.50 "), Some(dec!(1234.50)));
        assert_eq!(parse_amount("$ 2"), Some(dec!(2)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("N/A"), None);
    }

    #[test]
    fn test_decimal_from_f64() {
        assert_eq!(decimal_from_f64(0.24), Some(dec!(0.24)));
        assert_eq!(decimal_from_f64(0.485), Some(dec!(0.485)));
        assert_eq!(decimal_from_f64(f64::NAN), None);
    }

    #[test]
    fn test_validate_symbol_accepts_canonical() {
        let symbol = Symbol::parse("aapl").unwrap();
        assert!(validate_symbol("test", &symbol).is_ok());
    }

    #[test]
    fn test_infer_quarterly() {
        let records = vec![
            dated(2024, 11, 8),
            dated(2024, 8, 12),
            dated(2024, 5, 10),
            dated(2024, 2, 9),
        ];
        assert_eq!(infer_frequency(&records), Some("quarterly"));
    }

    #[test]
    fn test_infer_monthly_and_annual() {
        let monthly = vec![dated(2024, 3, 1), dated(2024, 2, 1), dated(2024, 1, 2)];
        assert_eq!(infer_frequency(&monthly), Some("monthly"));

        let annual = vec![dated(2024, 6, 1), dated(2023, 6, 1)];
        assert_eq!(infer_frequency(&annual), Some("annual"));

        let semi = vec![dated(2024, 7, 1), dated(2024, 1, 1)];
        assert_eq!(infer_frequency(&semi), Some("semi-annual"));
    }

    #[test]
    fn test_infer_irregular() {
        let records = vec![dated(2024, 6, 1), dated(2024, 5, 20)];
        assert_eq!(infer_frequency(&records), Some("irregular"));
    }

    #[test]
    fn test_infer_needs_two_dated_records() {
        assert_eq!(infer_frequency(&[dated(2024, 1, 1)]), None);
        assert_eq!(
            infer_frequency(&[
                DividendRecord::new("TEST", "test"),
                DividendRecord::new("TEST", "test")
            ]),
            None
        );
    }
}
