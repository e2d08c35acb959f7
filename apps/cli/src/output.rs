use chrono::{DateTime, Utc};
use serde::Serialize;

use dividend_calendar_data::{ErrorKind, RetrievalError};

/// Error body printed when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: ErrorKind,
    pub symbol: Option<String>,
    pub sources_attempted: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn from_retrieval(error: &RetrievalError, symbol: Option<&str>) -> Self {
        let symbol = match error {
            RetrievalError::InvalidSymbol { symbol, .. } => Some(symbol.clone()),
            _ => symbol.map(str::to_string),
        };
        Self {
            error: error.to_string(),
            error_code: error.kind(),
            symbol,
            sources_attempted: error.sources_attempted().to_vec(),
            timestamp: Utc::now(),
        }
    }
}

/// Pretty-print any serializable value to stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
