//! Property-based tests for symbol canonicalization and the cache.

use std::time::Duration;

use dividend_calendar_data::{DividendCache, DividendRecord, RetrievalResult, Symbol};
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

/// Generates a raw ticker with random case and surrounding whitespace.
fn arb_raw_ticker() -> impl Strategy<Value = String> {
    ("[ \t]{0,3}", "[a-zA-Z][a-zA-Z0-9.-]{0,9}", "[ \t]{0,3}")
        .prop_map(|(lead, body, trail)| format!("{lead}{body}{trail}"))
}

/// Generates a result with between one and five records.
fn arb_result(symbol: String) -> impl Strategy<Value = RetrievalResult> {
    proptest::collection::vec((1u32..=12, 1u32..=28, 1i64..100_000), 1..=5).prop_map(
        move |rows| {
            let records = rows
                .into_iter()
                .map(|(month, day, cents)| {
                    DividendRecord::regular(
                        symbol.as_str(),
                        "yahoo",
                        NaiveDate::from_ymd_opt(2024, month, day).unwrap(),
                        Decimal::new(cents, 2),
                    )
                })
                .collect();
            RetrievalResult::from_records(symbol.as_str(), records, "yahoo")
        },
    )
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Canonicalization is idempotent.
    #[test]
    fn prop_canonicalization_is_idempotent(raw in arb_raw_ticker()) {
        let once = Symbol::parse(&raw).unwrap();
        let twice = Symbol::parse(once.as_str()).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.as_str(), raw.trim().to_uppercase());
    }

    /// Anything with a character outside the ticker alphabet is rejected.
    #[test]
    fn prop_foreign_characters_are_rejected(
        prefix in "[A-Z]{1,4}",
        bad in "[!@#$%^&*()/_ ]",
        suffix in "[A-Z]{1,4}",
    ) {
        let raw = format!("{prefix}{bad}{suffix}");
        prop_assert!(Symbol::parse(&raw).is_err());
    }

    /// Anything longer than ten characters is rejected.
    #[test]
    fn prop_long_tickers_are_rejected(raw in "[A-Z]{11,20}") {
        prop_assert!(Symbol::parse(&raw).is_err());
    }

    /// A stored result reads back with the same records for any positive TTL.
    #[test]
    fn prop_cache_round_trip(
        result in arb_result("AAPL".to_string()),
        ttl_secs in 1u64..100_000,
    ) {
        let cache = DividendCache::default();
        let symbol = Symbol::parse("AAPL").unwrap();

        prop_assert!(cache.set(&symbol, &result, None, Some(Duration::from_secs(ttl_secs))));
        let hit = cache.get(&symbol, None).unwrap();

        prop_assert!(hit.cached);
        prop_assert_eq!(hit.total_count, result.total_count);
        prop_assert_eq!(hit.dividends, result.dividends);
    }
}
