// Bayun Query Execution Engine

pub mod catalog;
pub mod common;
pub mod config;
pub mod query;
pub mod storage;

// Re-export key items for convenient access
pub use catalog::Catalog;
pub use common::Value;
pub use config::EngineConfig;
pub use query::ast::Statement;
pub use query::executor::engine::{ExecutionEngine, Session};
pub use query::executor::response::Response;
pub use query::executor::result::{QueryError, QueryResult};
pub use storage::StorageEngine;
