//! Adapter implementations
//!
//! Concrete implementations of port traits for external systems.

pub mod duckdb;
pub mod memory;

pub use self::duckdb::DuckDbRepository;
pub use self::memory::MemoryRepository;
