//! Yahoo Finance dividend provider.
//!
//! Reads the dividend history from the chart API with `events=div`, which
//! returns every distribution over the requested range together with the
//! instrument's currency and display names.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration};
use reqwest::Client;
use rust_decimal::Decimal;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use urlencoding::encode;

use crate::errors::ProviderError;
use crate::models::{sort_most_recent_first, DividendRecord, Symbol};
use crate::provider::http;
use crate::provider::parsing::{decimal_from_f64, infer_frequency, validate_symbol};
use crate::provider::pacer::RequestPacer;
use crate::provider::{DividendProvider, RateLimit, DEFAULT_REQUEST_TIMEOUT};

use models::YahooChartResponse;

const PROVIDER_ID: &str = "yahoo";

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// How many of the most recent records receive the inferred frequency and yield.
const ENRICHED_RECORDS: usize = 5;

/// Window of payments summed into the trailing yield.
const TRAILING_WINDOW_DAYS: i64 = 365;

/// Yahoo Finance dividend provider.
pub struct YahooProvider {
    client: OnceCell<Client>,
    pacer: RequestPacer,
    rate_limit: RateLimit,
}

impl YahooProvider {
    /// Create the provider. The HTTP client is built lazily by `prepare`.
    pub fn new() -> Self {
        let rate_limit = RateLimit {
            min_delay: Duration::from_secs(1),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };
        Self {
            client: OnceCell::new(),
            pacer: RequestPacer::new(PROVIDER_ID, rate_limit.min_delay),
            rate_limit,
        }
    }

    async fn client(&self) -> Result<&Client, ProviderError> {
        self.client
            .get_or_try_init(|| async {
                http::build_client(PROVIDER_ID, self.rate_limit.request_timeout)
            })
            .await
    }

    fn chart_url(symbol: &Symbol) -> String {
        format!(
            "{}/{}?range=10y&interval=1mo&events=div",
            CHART_URL,
            encode(symbol.as_str())
        )
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DividendProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        1
    }

    fn rate_limit(&self) -> RateLimit {
        self.rate_limit.clone()
    }

    async fn prepare(&self) -> Result<(), ProviderError> {
        self.client().await.map(|_| ())
    }

    async fn fetch_dividends(
        &self,
        symbol: &Symbol,
        cancel: &CancellationToken,
    ) -> Result<Vec<DividendRecord>, ProviderError> {
        validate_symbol(PROVIDER_ID, symbol)?;
        let client = self.client().await?;

        self.pacer.wait_turn(cancel).await?;

        let url = Self::chart_url(symbol);
        let Some(body) = http::get_text(PROVIDER_ID, client, &url, cancel).await? else {
            debug!("Yahoo has no chart for {}", symbol);
            return Ok(Vec::new());
        };

        let response: YahooChartResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::transport(PROVIDER_ID, format!("Failed to parse chart response: {}", e))
        })?;

        let records = records_from_chart(symbol, response);
        info!("Yahoo returned {} dividend records for {}", records.len(), symbol);
        Ok(records)
    }
}

/// Convert a chart response into dividend records, most recent first.
///
/// A chart error object or a missing `events` block both mean "no dividends".
fn records_from_chart(symbol: &Symbol, response: YahooChartResponse) -> Vec<DividendRecord> {
    if let Some(error) = response.chart.error {
        debug!(
            "Yahoo chart error for {}: {} {}",
            symbol,
            error.code,
            error.description.unwrap_or_default()
        );
        return Vec::new();
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Vec::new();
    };

    let company_name = result
        .meta
        .long_name
        .filter(|name| !name.trim().is_empty())
        .or(result.meta.short_name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty() && name != symbol.as_str());
    let currency = result.meta.currency.filter(|c| !c.trim().is_empty());
    let price = result.meta.regular_market_price;

    let events = result.events.map(|e| e.dividends).unwrap_or_default();

    let mut records: Vec<DividendRecord> = events
        .into_values()
        .filter_map(|event| {
            let Some(ex_date) = DateTime::from_timestamp(event.date, 0) else {
                warn!("Skipping Yahoo dividend with invalid timestamp {}", event.date);
                return None;
            };
            let amount = decimal_from_f64(event.amount)?;
            if amount.is_sign_negative() {
                warn!("Skipping negative Yahoo dividend {} for {}", amount, symbol);
                return None;
            }

            let mut record =
                DividendRecord::regular(symbol.as_str(), PROVIDER_ID, ex_date.date_naive(), amount);
            record.company_name = company_name.clone();
            if let Some(currency) = &currency {
                record.currency = currency.clone();
            }
            Some(record)
        })
        .collect();

    sort_most_recent_first(&mut records);

    let frequency = infer_frequency(&records);
    let yield_percentage = price.and_then(|price| trailing_yield(&records, price));
    for record in records.iter_mut().take(ENRICHED_RECORDS) {
        record.frequency = frequency.map(str::to_string);
        record.yield_percentage = yield_percentage;
    }

    records
}

/// Trailing twelve-month yield in percent, rounded to two decimals.
///
/// Sums the payments within a year of the latest ex-date and divides by the
/// last price. `None` without a dated record or a positive price.
fn trailing_yield(records: &[DividendRecord], price: f64) -> Option<Decimal> {
    let price = decimal_from_f64(price).filter(|p| p.is_sign_positive() && !p.is_zero())?;
    let latest = records.iter().find_map(|r| r.ex_date)?;
    let cutoff = latest - ChronoDuration::days(TRAILING_WINDOW_DAYS);

    let trailing: Decimal = records
        .iter()
        .filter(|r| r.ex_date.is_some_and(|date| date > cutoff))
        .filter_map(|r| r.amount)
        .sum();

    Some((trailing / price * Decimal::ONE_HUNDRED).round_dp(2))
}
