/// Currency assumed when a provider doesn't report one
pub const DEFAULT_CURRENCY: &str = "USD";
