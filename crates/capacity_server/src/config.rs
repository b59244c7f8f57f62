//! Server configuration from environment variables.
//!
//!   CAPACITY_DATABASE_URL     - Postgres connection string (required)
//!   CAPACITY_BIND_ADDR        - listen address (default: 0.0.0.0:8081)
//!   TECHNOLOGY_MNGR_BASE_URL  - technology service base URL (required)
//!
//! plus pool, migration and resilience tuning knobs with the defaults below.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use capacity_tech_client::resilience::{BulkheadConfig, CircuitBreakerConfig, RetryConfig};
use capacity_tech_client::TechnologyClientConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub technology: TechnologyClientConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source. Unset and empty values take the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env { lookup };

        let technology = TechnologyClientConfig {
            base_url: env.required("TECHNOLOGY_MNGR_BASE_URL")?,
            timeout: env.millis("TECHNOLOGY_MNGR_TIMEOUT_MS", 5000)?,
            retry: RetryConfig {
                max_attempts: env.parse_or("TECHNOLOGY_MNGR_RETRY_MAX_ATTEMPTS", 3)?,
                wait: env.millis("TECHNOLOGY_MNGR_RETRY_WAIT_MS", 500)?,
            },
            bulkhead: BulkheadConfig {
                max_concurrent: env.parse_or("TECHNOLOGY_MNGR_BULKHEAD_MAX_CONCURRENT", 10)?,
                max_wait: env.millis("TECHNOLOGY_MNGR_BULKHEAD_MAX_WAIT_MS", 0)?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_rate_threshold: env.parse_or("TECHNOLOGY_MNGR_CB_FAILURE_RATE", 50)?,
                window_size: env.parse_or("TECHNOLOGY_MNGR_CB_WINDOW_SIZE", 10)?,
                min_calls: env.parse_or("TECHNOLOGY_MNGR_CB_MIN_CALLS", 5)?,
                open_duration: env.millis("TECHNOLOGY_MNGR_CB_OPEN_MS", 10_000)?,
                half_open_calls: env.parse_or("TECHNOLOGY_MNGR_CB_HALF_OPEN_CALLS", 3)?,
            },
        };
        if technology.circuit_breaker.failure_rate_threshold > 100 {
            return Err(anyhow!(
                "TECHNOLOGY_MNGR_CB_FAILURE_RATE must be a percentage between 0 and 100"
            ));
        }

        Ok(Self {
            database_url: env.required("CAPACITY_DATABASE_URL")?,
            bind_addr: env.parse_or("CAPACITY_BIND_ADDR", "0.0.0.0:8081".to_string())?,
            db_max_connections: env.parse_or("CAPACITY_DB_MAX_CONNECTIONS", 10)?,
            run_migrations: env.parse_or("CAPACITY_RUN_MIGRATIONS", true)?,
            technology,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .with_context(|| format!("{key} must be set"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("invalid value {raw:?} for {key}: {e}")),
        }
    }

    fn millis(&self, key: &str, default_ms: u64) -> Result<Duration> {
        self.parse_or(key, default_ms).map(Duration::from_millis)
    }
}
