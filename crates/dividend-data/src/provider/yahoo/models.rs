//! Yahoo Finance API response models.
//!
//! These models are used for parsing the chart API responses requested with
//! `events=div`, which carry the dividend history of a symbol.

use std::collections::HashMap;

use serde::Deserialize;

/// Main response wrapper for the chart API
#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

/// Chart container - either results or an error object
#[derive(Debug, Deserialize)]
pub struct YahooChart {
    #[serde(default)]
    pub result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    pub error: Option<YahooChartError>,
}

/// Error object, e.g. `{"code": "Not Found", "description": "No data found, symbol may be delisted"}`
#[derive(Debug, Deserialize)]
pub struct YahooChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Individual result from the chart API
#[derive(Debug, Deserialize)]
pub struct YahooChartResult {
    pub meta: YahooChartMeta,
    #[serde(default)]
    pub events: Option<YahooChartEvents>,
}

/// Instrument metadata
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooChartMeta {
    pub currency: Option<String>,
    pub symbol: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    /// Last traded price, the denominator of the trailing yield
    pub regular_market_price: Option<f64>,
}

/// Corporate events attached to the chart
#[derive(Debug, Deserialize)]
pub struct YahooChartEvents {
    /// Keyed by the event's unix timestamp as a string
    #[serde(default)]
    pub dividends: HashMap<String, YahooDividendEvent>,
}

/// One dividend event
#[derive(Debug, Deserialize, Clone)]
pub struct YahooDividendEvent {
    pub amount: f64,
    /// Unix timestamp of the ex-dividend date
    pub date: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_with_dividends() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"currency": "USD", "symbol": "KO", "longName": "The Coca-Cola Company", "shortName": "Coca-Cola Company (The)"},
                    "timestamp": [1704085200],
                    "events": {"dividends": {
                        "1710423000": {"amount": 0.485, "date": 1710423000},
                        "1718285400": {"amount": 0.485, "date": 1718285400}
                    }}
                }],
                "error": null
            }
        }"#;

        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let result = &response.chart.result.unwrap()[0];
        assert_eq!(result.meta.currency.as_deref(), Some("USD"));
        assert_eq!(
            result.meta.long_name.as_deref(),
            Some("The Coca-Cola Company")
        );
        assert_eq!(result.events.as_ref().unwrap().dividends.len(), 2);
    }

    #[test]
    fn test_parse_chart_without_events() {
        // Symbols that never paid a dividend have no events object at all
        let json = r#"{"chart": {"result": [{"meta": {"currency": "USD", "symbol": "TSLA"}}], "error": null}}"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let result = &response.chart.result.unwrap()[0];
        assert!(result.events.is_none());
    }

    #[test]
    fn test_parse_chart_error() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        assert!(response.chart.result.is_none());
        assert_eq!(response.chart.error.unwrap().code, "Not Found");
    }
}
