//! capacity_core: pure domain types, port traits and use cases for the
//! capacity service. No database or HTTP client code lives here.

pub mod error;
pub mod memory;
pub mod model;
pub mod page;
pub mod ports;
pub mod service;
pub mod validator;

pub use error::{CapacityError, TechnicalMessage};
pub use page::CustomPage;
pub use service::{CapacityServicePort, CapacityUseCase};
