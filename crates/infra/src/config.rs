//! Runtime settings read from `BAZAAR_*` environment variables.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use bazaar_core::Money;

use crate::stock::RetryPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// What checkout does with stock before persisting each seller order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StockMode {
    /// Validate availability only.
    None,
    /// Write advisory reservations.
    #[default]
    Reserve,
    /// Decrement inventory under the per-SKU lease.
    Deduct,
}

impl StockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockMode::None => "none",
            StockMode::Reserve => "reserve",
            StockMode::Deduct => "deduct",
        }
    }
}

impl FromStr for StockMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(StockMode::None),
            "reserve" => Ok(StockMode::Reserve),
            "deduct" => Ok(StockMode::Deduct),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub redis_url: Option<String>,
    pub database_url: Option<String>,
    pub events_channel: String,
    pub stock_mode: StockMode,
    pub reservation_ttl: Duration,
    pub lease_ttl: Duration,
    pub lease_max_attempts: u32,
    pub lease_retry_delay: Duration,
    pub cart_ttl: Duration,
    pub flat_shipping_fee: Money,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            redis_url: None,
            database_url: None,
            events_channel: "bazaar:events:orders".to_string(),
            stock_mode: StockMode::Reserve,
            reservation_ttl: Duration::from_secs(15 * 60),
            lease_ttl: Duration::from_secs(10),
            lease_max_attempts: 10,
            lease_retry_delay: Duration::from_millis(50),
            cart_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            flat_shipping_fee: Money::ZERO,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset or blank keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut s = Settings::default();

        if let Some(v) = get("BAZAAR_BIND_ADDR") {
            s.bind_addr = v;
        }
        s.redis_url = get("BAZAAR_REDIS_URL");
        s.database_url = get("BAZAAR_DATABASE_URL");
        if let Some(v) = get("BAZAAR_EVENTS_CHANNEL") {
            s.events_channel = v;
        }
        if let Some(v) = get("BAZAAR_STOCK_MODE") {
            s.stock_mode = v.parse().map_err(|_| invalid("BAZAAR_STOCK_MODE", &v))?;
        }
        if let Some(v) = get("BAZAAR_RESERVATION_TTL_SECS") {
            s.reservation_ttl = Duration::from_secs(parse_positive("BAZAAR_RESERVATION_TTL_SECS", &v)?);
        }
        if let Some(v) = get("BAZAAR_LEASE_TTL_SECS") {
            s.lease_ttl = Duration::from_secs(parse_positive("BAZAAR_LEASE_TTL_SECS", &v)?);
        }
        if let Some(v) = get("BAZAAR_LEASE_MAX_ATTEMPTS") {
            let n = parse_positive("BAZAAR_LEASE_MAX_ATTEMPTS", &v)?;
            s.lease_max_attempts = u32::try_from(n).map_err(|_| invalid("BAZAAR_LEASE_MAX_ATTEMPTS", &v))?;
        }
        if let Some(v) = get("BAZAAR_LEASE_RETRY_DELAY_MS") {
            let ms = v.trim().parse::<u64>().map_err(|_| invalid("BAZAAR_LEASE_RETRY_DELAY_MS", &v))?;
            s.lease_retry_delay = Duration::from_millis(ms);
        }
        if let Some(v) = get("BAZAAR_CART_TTL_SECS") {
            s.cart_ttl = Duration::from_secs(parse_positive("BAZAAR_CART_TTL_SECS", &v)?);
        }
        if let Some(v) = get("BAZAAR_FLAT_SHIPPING_FEE") {
            let fee: Money = v.parse().map_err(|_| invalid("BAZAAR_FLAT_SHIPPING_FEE", &v))?;
            if fee.is_negative() {
                return Err(invalid("BAZAAR_FLAT_SHIPPING_FEE", &v));
            }
            s.flat_shipping_fee = fee;
        }

        Ok(s)
    }

    pub fn lease_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.lease_max_attempts, self.lease_retry_delay)
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, value)),
    }
}
