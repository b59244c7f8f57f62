use std::time::Duration;

use crate::resilience::{BulkheadConfig, CircuitBreakerConfig, RetryConfig};

/// Connection and resilience settings for the technology service client.
#[derive(Debug, Clone)]
pub struct TechnologyClientConfig {
    pub base_url: String,
    /// Per-request timeout, applied to every attempt.
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub bulkhead: BulkheadConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl TechnologyClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for TechnologyClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            timeout: Duration::from_millis(5000),
            retry: RetryConfig::default(),
            bulkhead: BulkheadConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}
