//! Provider registry module.
//!
//! This module provides the bookkeeping around dividend providers:
//! - Provider registration, priority ordering and source resolution
//! - One-time provider preparation
//! - Per-provider health statistics

mod health_tracker;
mod provider_registry;

pub use health_tracker::{HealthTracker, ProviderHealthSnapshot};
pub use provider_registry::ProviderRegistry;
