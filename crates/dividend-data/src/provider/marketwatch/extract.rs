//! Text extraction for MarketWatch stock pages.
//!
//! The pages are scanned as flattened text: markup is stripped, whitespace is
//! collapsed, and the key-data labels ("Dividend", "Yield", "Ex-Dividend Date")
//! are matched together with the value that follows them.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::DividendRecord;
use crate::provider::parsing::{parse_amount, parse_date};

use super::PROVIDER_ID;

/// Dates as MarketWatch prints them: "Feb 9, 2024", "02/09/2024", "2024-02-09".
const DATE: &str = r"([A-Za-z]{3,9}\.?\s+\d{1,2},?\s+\d{4}|\d{1,2}/\d{1,2}/\d{4}|\d{1,2}-\d{1,2}-\d{4}|\d{4}-\d{2}-\d{2})";

lazy_static! {
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script\b.*?</script>").unwrap();
    static ref STYLE_BLOCK: Regex = Regex::new(r"(?is)<style\b.*?</style>").unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref H1: Regex = Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").unwrap();
    static ref AMOUNT: Regex =
        Regex::new(r"(?i)\bdividend\b[^$%\d]{0,40}\$\s?(\d+(?:\.\d+)?)").unwrap();
    static ref YIELD: Regex = Regex::new(r"(?i)\byield\b[^%\d]{0,40}(\d+(?:\.\d+)?)\s?%").unwrap();
    static ref EX_DATE: Regex =
        Regex::new(&format!(r"(?i)\bex[-\s]?dividend(?:\s+date)?\s*:?\s*{}", DATE)).unwrap();
    static ref PAY_DATE: Regex =
        Regex::new(&format!(r"(?i)\bpay(?:ment|able)?\s+date\s*:?\s*{}", DATE)).unwrap();
    static ref FREQUENCY: Regex = Regex::new(
        r"(?i)(?:\b(semi-?annual|quarterly|monthly|annual)(?:ly)?\s+dividend|\bdividend\s+frequency\s*:?\s*(semi-?annual|quarterly|monthly|annual))"
    )
    .unwrap();
}

/// Flatten an HTML page into a single line of visible text.
pub(super) fn page_text(html: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(html, " ");
    let without_styles = STYLE_BLOCK.replace_all(&without_scripts, " ");
    let text = TAG.replace_all(&without_styles, " ");
    let text = decode_entities(&text);
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#36;", "$")
        .replace("&#37;", "%")
        .replace("&amp;", "&")
}

/// Company name from the page heading, without the "(SYMBOL)" suffix.
pub(super) fn company_name(html: &str, symbol: &str) -> Option<String> {
    let heading = H1.captures(html)?.get(1)?.as_str();
    let heading = page_text(heading);

    let suffix = Regex::new(&format!(r"(?i)\s*\({}\)\s*", regex::escape(symbol))).ok()?;
    let name = suffix.replace_all(&heading, " ").trim().to_string();

    (name.chars().count() > 2).then_some(name)
}

fn frequency(text: &str) -> Option<String> {
    let captures = FREQUENCY.captures(text)?;
    let raw = captures.get(1).or_else(|| captures.get(2))?.as_str();
    let label = match raw.to_ascii_lowercase().as_str() {
        "quarterly" => "quarterly",
        "monthly" => "monthly",
        "annual" => "annual",
        _ => "semi-annual",
    };
    Some(label.to_string())
}

fn first_capture<'t>(regex: &Regex, text: &'t str) -> Option<&'t str> {
    regex.captures(text)?.get(1).map(|m| m.as_str())
}

/// Extract the current dividend of `symbol` from a stock page.
///
/// Returns `None` unless a positive dividend amount is present.
pub fn extract_dividend(symbol: &str, html: &str) -> Option<DividendRecord> {
    let text = page_text(html);

    let amount = first_capture(&AMOUNT, &text)
        .and_then(parse_amount)
        .filter(|amount| *amount > Decimal::ZERO)?;

    let mut record = DividendRecord::new(symbol, PROVIDER_ID);
    record.amount = Some(amount);
    record.company_name = company_name(html, symbol);
    record.yield_percentage = first_capture(&YIELD, &text).and_then(|y| y.parse().ok());
    record.ex_date = first_capture(&EX_DATE, &text).and_then(parse_date);
    record.pay_date = first_capture(&PAY_DATE, &text).and_then(parse_date);
    record.frequency = frequency(&text);

    Some(record)
}
