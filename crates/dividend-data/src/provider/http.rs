//! HTTP plumbing shared by the scraping providers.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::ProviderError;

/// Browser-like user agent; both sites reject the reqwest default.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Build the HTTP client a provider keeps for its lifetime.
pub fn build_client(provider: &str, timeout: Duration) -> Result<Client, ProviderError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static("en-US,en;q=0.5"),
    );

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| {
            ProviderError::transport(provider, format!("Failed to build HTTP client: {}", e))
        })
}

/// GET a URL and return its body.
///
/// `Ok(None)` means the page does not exist (404). A 429 maps to
/// [`ProviderError::RateLimited`]; any other non-success status, network
/// failure or body read failure maps to [`ProviderError::Transport`].
/// The request is abandoned as soon as `cancel` fires.
pub async fn get_text(
    provider: &str,
    client: &Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<Option<String>, ProviderError> {
    let request = async {
        debug!("{} GET {}", provider, url);
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::transport(provider, format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                provider: provider.to_string(),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::transport(provider, format!("HTTP {}", status)));
        }

        response.text().await.map(Some).map_err(|e| {
            ProviderError::transport(provider, format!("Failed to read body: {}", e))
        })
    };

    tokio::select! {
        result = request => result,
        _ = cancel.cancelled() => Err(ProviderError::Cancelled {
            provider: provider.to_string(),
        }),
    }
}
