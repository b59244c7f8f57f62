//! capacity_postgres: PostgreSQL adapter for the capacity persistence port.

mod rows;
pub mod store;

pub use store::{PgCapacityStore, PgCapacityTransaction};
