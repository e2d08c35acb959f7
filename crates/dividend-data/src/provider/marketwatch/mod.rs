//! MarketWatch dividend provider.
//!
//! MarketWatch has no dividend API. The provider scrapes the stock page's key
//! data (current dividend, yield, ex-date, pay date) and yields at most one
//! record per symbol. When the main stock page has no dividend, the
//! `/overview` page is tried as well.

mod extract;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ProviderError;
use crate::models::{DividendRecord, Symbol};
use crate::provider::http;
use crate::provider::pacer::RequestPacer;
use crate::provider::parsing::validate_symbol;
use crate::provider::{DividendProvider, RateLimit, DEFAULT_REQUEST_TIMEOUT};

pub use extract::extract_dividend;

const PROVIDER_ID: &str = "marketwatch";

const BASE_URL: &str = "https://www.marketwatch.com/investing/stock";

/// MarketWatch dividend provider.
pub struct MarketWatchProvider {
    base_url: String,
    client: OnceCell<Client>,
    pacer: RequestPacer,
    rate_limit: RateLimit,
}

impl MarketWatchProvider {
    /// Create the provider. The HTTP client is built lazily by `prepare`.
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Create the provider against another stock page root.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let rate_limit = RateLimit {
            min_delay: Duration::from_millis(1500),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
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

    fn page_urls(&self, symbol: &Symbol) -> [String; 2] {
        let slug = symbol.as_str().to_ascii_lowercase();
        [
            format!("{}/{}", self.base_url, slug),
            format!("{}/{}/overview", self.base_url, slug),
        ]
    }

    /// Fetch one page and extract its dividend on the blocking pool.
    async fn scrape_page(
        &self,
        client: &Client,
        symbol: &Symbol,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<DividendRecord>, ProviderError> {
        self.pacer.wait_turn(cancel).await?;

        let Some(html) = http::get_text(PROVIDER_ID, client, url, cancel).await? else {
            debug!("MarketWatch page not found: {}", url);
            return Ok(None);
        };

        let symbol = symbol.to_string();
        tokio::task::spawn_blocking(move || extract_dividend(&symbol, &html))
            .await
            .map_err(|e| ProviderError::transport(PROVIDER_ID, format!("Extraction failed: {}", e)))
    }
}

impl Default for MarketWatchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DividendProvider for MarketWatchProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        2
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
        let [stock_page, overview_page] = self.page_urls(symbol);

        match self.scrape_page(client, symbol, &stock_page, cancel).await {
            Ok(Some(record)) => {
                info!("MarketWatch stock page has a dividend for {}", symbol);
                return Ok(vec![record]);
            }
            Ok(None) => {}
            // A failed stock page still leaves the overview page to try
            Err(ProviderError::Transport { message, .. }) => {
                warn!("MarketWatch stock page failed for {}: {}", symbol, message);
            }
            Err(e) => return Err(e),
        }

        let record = self
            .scrape_page(client, symbol, &overview_page, cancel)
            .await?;
        if record.is_none() {
            info!("MarketWatch has no dividend for {}", symbol);
        }
        Ok(record.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DIVIDEND_PAGE: &str = r#"
        <h1>Apple Inc. (AAPL)</h1>
        <li>Dividend <span>$0.25</span></li>
        <li>Ex-Dividend Date <span>Nov 8, 2024</span></li>
    "#;

    async fn mount(server: &MockServer, page: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn aapl() -> Symbol {
        Symbol::parse("AAPL").unwrap()
    }

    #[test]
    fn test_provider_identity() {
        let provider = MarketWatchProvider::new();
        assert_eq!(provider.id(), "marketwatch");
        assert_eq!(provider.priority(), 2);
        assert_eq!(
            provider.rate_limit().min_delay,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_page_urls_use_lowercase_symbol() {
        let provider = MarketWatchProvider::new();
        let [stock, overview] = provider.page_urls(&Symbol::parse("AAPL").unwrap());
        assert_eq!(stock, "https://www.marketwatch.com/investing/stock/aapl");
        assert_eq!(
            overview,
            "https://www.marketwatch.com/investing/stock/aapl/overview"
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let provider = MarketWatchProvider::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = provider
            .fetch_dividends(&Symbol::parse("AAPL").unwrap(), &cancel)
            .await;
        assert!(matches!(result, Err(ProviderError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_failed_stock_page_falls_back_to_overview() {
        let server = MockServer::start().await;
        mount(&server, "/aapl", ResponseTemplate::new(503)).await;
        mount(
            &server,
            "/aapl/overview",
            ResponseTemplate::new(200).set_body_string(DIVIDEND_PAGE),
        )
        .await;

        let provider = MarketWatchProvider::with_base_url(server.uri());
        let records = provider
            .fetch_dividends(&aapl(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, Some(dec!(0.25)));
        assert_eq!(records[0].company_name.as_deref(), Some("Apple Inc."));
    }

    #[tokio::test]
    async fn test_page_without_dividend_falls_back_to_overview() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/aapl",
            ResponseTemplate::new(200).set_body_string("<h1>Apple Inc. (AAPL)</h1>"),
        )
        .await;
        mount(
            &server,
            "/aapl/overview",
            ResponseTemplate::new(200).set_body_string(DIVIDEND_PAGE),
        )
        .await;

        let provider = MarketWatchProvider::with_base_url(format!("{}/", server.uri()));
        let records = provider
            .fetch_dividends(&aapl(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_stock_page_skips_overview() {
        let server = MockServer::start().await;
        mount(&server, "/aapl", ResponseTemplate::new(429)).await;
        Mock::given(method("GET"))
            .and(path("/aapl/overview"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DIVIDEND_PAGE))
            .expect(0)
            .mount(&server)
            .await;

        let provider = MarketWatchProvider::with_base_url(server.uri());
        let result = provider
            .fetch_dividends(&aapl(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_missing_pages_are_empty() {
        let server = MockServer::start().await;

        // Unmatched paths answer 404
        let provider = MarketWatchProvider::with_base_url(server.uri());
        let records = provider
            .fetch_dividends(&aapl(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(records.is_empty());
    }
}
