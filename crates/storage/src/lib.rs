//! Persistence for the benchmark pipeline: the [`BenchStore`] port, an
//! in-memory implementation and a PostgreSQL one.

pub mod catalog;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod report;
pub mod store;

pub use catalog::{builtin_catalog, Catalog};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{BenchStore, ExecutionFilter, PageRequest, ReportGroup, ReportQuery, ReportRow};
