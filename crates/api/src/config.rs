//! Application configuration loaded from environment variables.

use common::Money;
use domain::ShippingRates;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: Postgres connection string; in-memory storage when unset
/// - `SHIPPING_STANDARD_CENTS`, `SHIPPING_EXPRESS_CENTS`,
///   `SHIPPING_OVERNIGHT_CENTS`: shipping prices (default: 500 / 1500 / 2500)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub shipping_standard_cents: i64,
    pub shipping_express_cents: i64,
    pub shipping_overnight_cents: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let cents = |key: &str, default: i64| {
            lookup(key)
                .and_then(|v| v.parse().ok())
                .filter(|c: &i64| *c >= 0)
                .unwrap_or(default)
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            shipping_standard_cents: cents(
                "SHIPPING_STANDARD_CENTS",
                defaults.shipping_standard_cents,
            ),
            shipping_express_cents: cents("SHIPPING_EXPRESS_CENTS", defaults.shipping_express_cents),
            shipping_overnight_cents: cents(
                "SHIPPING_OVERNIGHT_CENTS",
                defaults.shipping_overnight_cents,
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shipping price table built from the configured amounts.
    pub fn shipping_rates(&self) -> ShippingRates {
        ShippingRates::new(
            Money::from_cents(self.shipping_standard_cents),
            Money::from_cents(self.shipping_express_cents),
            Money::from_cents(self.shipping_overnight_cents),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            shipping_standard_cents: 500,
            shipping_express_cents: 1500,
            shipping_overnight_cents: 2500,
        }
    }
}
