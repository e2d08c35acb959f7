//! Error types and retry classification for the dividend data crate.
//!
//! This module provides:
//! - [`ProviderError`]: Failures raised by a single provider attempt
//! - [`RetryClass`]: Classification for determining fallback behavior
//! - [`RetrievalError`]: The structured error surfaced to callers of the service

mod retry;

pub use retry::RetryClass;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a single provider can raise while fetching dividends.
///
/// "No dividends found" is not an error: providers return an empty record set
/// for that case. Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class).
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The symbol failed the provider's defensive validation.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// Network, timeout, HTTP status or parse failure.
    #[error("Transport error: {provider} - {message}")]
    Transport {
        /// The provider that failed
        provider: String,
        /// What went wrong
        message: String,
    },

    /// The attempt observed its cancellation token.
    #[error("Cancelled: {provider}")]
    Cancelled {
        /// The provider whose attempt was cancelled
        provider: String,
    },
}

impl ProviderError {
    /// Shorthand for a [`ProviderError::Transport`].
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns the fallback classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use dividend_calendar_data::errors::{ProviderError, RetryClass};
    ///
    /// let error = ProviderError::RateLimited { provider: "yahoo".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::BackoffThenNext);
    ///
    /// let error = ProviderError::InvalidSymbol("".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::InvalidSymbol(_) | Self::Cancelled { .. } => RetryClass::Never,
            Self::RateLimited { .. } => RetryClass::BackoffThenNext,
            Self::Transport { .. } => RetryClass::NextProvider,
        }
    }
}

/// Kind tag carried by every [`RetrievalError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidSymbol,
    InvalidSourceList,
    ProviderUnavailable,
    InternalError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSymbol => write!(f, "INVALID_SYMBOL"),
            Self::InvalidSourceList => write!(f, "INVALID_SOURCE_LIST"),
            Self::ProviderUnavailable => write!(f, "PROVIDER_UNAVAILABLE"),
            Self::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Errors surfaced by the retrieval service.
///
/// Provider failures never appear here directly: they are absorbed into
/// fallback decisions. Only caller errors and cross-cutting failures
/// interrupt a retrieval.
#[derive(Error, Debug, Clone)]
pub enum RetrievalError {
    /// The symbol (or batch) supplied by the caller is not acceptable.
    #[error("Invalid symbol: {message}")]
    InvalidSymbol {
        /// The raw input as supplied
        symbol: String,
        message: String,
    },

    /// The caller asked for providers that are not registered.
    #[error("Invalid sources: {}. Valid sources: {}", unknown.join(", "), valid.join(", "))]
    InvalidSourceList {
        unknown: Vec<String>,
        valid: Vec<String>,
    },

    /// No provider could be attempted (none configured or none ready).
    #[error("No providers available: {message}")]
    ProviderUnavailable {
        message: String,
        sources_attempted: Vec<String>,
    },

    /// An unexpected defect inside the service.
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        sources_attempted: Vec<String>,
    },
}

impl RetrievalError {
    /// The kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSymbol { .. } => ErrorKind::InvalidSymbol,
            Self::InvalidSourceList { .. } => ErrorKind::InvalidSourceList,
            Self::ProviderUnavailable { .. } => ErrorKind::ProviderUnavailable,
            Self::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// Sources attempted before the error interrupted the retrieval.
    pub fn sources_attempted(&self) -> &[String] {
        match self {
            Self::ProviderUnavailable {
                sources_attempted, ..
            }
            | Self::Internal {
                sources_attempted, ..
            } => sources_attempted,
            Self::InvalidSymbol { .. } | Self::InvalidSourceList { .. } => &[],
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
    }
}
