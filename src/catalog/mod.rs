//! Catalog Management Module
//!
//! This module manages the schema metadata the executor resolves against:
//! tables, their columns, and the indexes declared on them.

pub mod catalog;
pub mod column;
pub mod schema;
pub mod table;

// Re-export key types
pub use self::catalog::Catalog;
pub use self::column::Column;
pub use self::schema::{DataType, DATE_LENGTH};
pub use self::table::{IndexMeta, Table};
