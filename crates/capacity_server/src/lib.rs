//! capacity_server: REST surface over the capacity use cases.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
