// Query Executor Module
//
// This module is responsible for executing statements and producing responses.
// It implements the iterator-based execution model for query processing.

pub mod access_path;
pub mod binder;
pub mod engine;
pub mod expression_eval;
pub mod operators;
pub mod response;
pub mod result;

// Export key types
pub use self::engine::{ExecutionEngine, Session};
pub use self::operators::Operator;
pub use self::response::Response;
pub use self::result::{QueryError, QueryResult};
