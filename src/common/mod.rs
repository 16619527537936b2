// Common Types Module
//
// Identifiers and the scalar value type shared by storage, catalog and executor.

pub mod types;
pub mod value;

pub use self::types::{Rid, TableId};
pub use self::value::Value;
