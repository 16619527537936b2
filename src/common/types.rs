/// Record ID type: slot number of a record inside its table heap
pub type Rid = u64;

/// Table ID type, assigned by the catalog
pub type TableId = u32;
