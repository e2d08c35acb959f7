use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::DEFAULT_CURRENCY;

/// Kind of dividend distribution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DividendKind {
    Regular,
    Special,
    Interim,
    Final,
}

/// One dividend event as reported by a provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    /// Canonical ticker symbol
    pub symbol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// Ex-dividend date
    pub ex_date: Option<NaiveDate>,

    pub record_date: Option<NaiveDate>,

    pub pay_date: Option<NaiveDate>,

    pub announcement_date: Option<NaiveDate>,

    /// Amount per share, never negative
    pub amount: Option<Decimal>,

    /// Currency of the payment
    pub currency: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_type: Option<DividendKind>,

    /// Frequency label (monthly, quarterly, semi-annual, annual, irregular)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,

    /// Current dividend yield in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_percentage: Option<Decimal>,

    /// Provider that produced the record
    pub source: String,

    /// When the record was captured
    pub captured_at: DateTime<Utc>,
}

impl DividendRecord {
    /// Create a record with only the provenance fields set
    pub fn new(symbol: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: None,
            ex_date: None,
            record_date: None,
            pay_date: None,
            announcement_date: None,
            amount: None,
            currency: DEFAULT_CURRENCY.to_string(),
            dividend_type: None,
            frequency: None,
            yield_percentage: None,
            source: source.into(),
            captured_at: Utc::now(),
        }
    }

    /// Create a regular dividend with an ex-date and amount
    pub fn regular(
        symbol: impl Into<String>,
        source: impl Into<String>,
        ex_date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        Self {
            ex_date: Some(ex_date),
            amount: Some(amount),
            dividend_type: Some(DividendKind::Regular),
            ..Self::new(symbol, source)
        }
    }
}

/// Sort records most-recent-first by ex-date; undated records go last.
pub fn sort_most_recent_first(records: &mut [DividendRecord]) {
    records.sort_by(|a, b| b.ex_date.cmp(&a.ex_date));
}
