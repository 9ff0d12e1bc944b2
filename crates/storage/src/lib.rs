//! Storage backends for the rotation core: Postgres for production,
//! an in-memory DashMap store for tests and local development. Both
//! implement the `Catalog`, `Registry` and `StatsStore` capability traits.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;
