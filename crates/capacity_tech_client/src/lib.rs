//! capacity_tech_client: HTTP adapter for the remote technology service.
//!
//! Implements [`capacity_core::ports::TechnologiesGateway`] over reqwest and
//! wraps each call in [`resilience::ResiliencePolicy`].

pub mod client;
pub mod config;
pub mod error;
pub mod resilience;

pub use client::HttpTechnologiesGateway;
pub use config::TechnologyClientConfig;
pub use error::GatewayError;
