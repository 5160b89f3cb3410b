//! Pooled Postgres adapter. `sqlx`-based, matching the Postgres-backed
//! aggregator style recorded in DESIGN.md.

pub mod config;
pub mod pool;
pub mod rows;

pub use config::SqlConfig;
pub use pool::SqlStore;
