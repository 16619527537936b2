// Data Type Definitions
//
// This module defines the column types understood by the catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Data types supported by the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Date,
}

/// Storage length of date columns, whatever the declaration says
pub const DATE_LENGTH: usize = 12;

impl DataType {
    /// Length used when a column definition does not declare one
    pub fn default_length(&self) -> usize {
        match self {
            DataType::Integer | DataType::Float => 4,
            DataType::Text => 255,
            DataType::Date => DATE_LENGTH,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }

    /// Name used by `DESC`
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Integer => "ints",
            DataType::Float => "floats",
            DataType::Text => "chars",
            DataType::Date => "date",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
