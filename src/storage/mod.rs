// Storage Module
//
// In-memory record heaps and ordered secondary indexes used by the executor.

pub mod engine;
pub mod error;
pub mod heap;
pub mod index;

pub use engine::StorageEngine;
pub use error::StorageError;
pub use index::{IndexBound, OrderedIndex, ScanRange};
