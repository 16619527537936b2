// BayunDB Query Processing Module
//
// This module contains the statement tree consumed by the engine and the
// engine that executes it.

pub mod ast;
pub mod executor;

// Export key public interfaces
pub use ast::Statement;
pub use executor::engine::{ExecutionEngine, Session};
pub use executor::result::QueryResult;
