// Column Management Module
//
// This module defines the Column type that represents a database column schema.

use serde::{Deserialize, Serialize};

use super::schema::DataType;

/// Represents a column in a database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    name: String,
    /// Column data type
    data_type: DataType,
    /// Declared length; bounds text values
    length: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, data_type: DataType, length: usize) -> Self {
        Column {
            name: name.into(),
            data_type,
            length,
        }
    }

    /// Get the column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the column data type
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Get the declared length
    pub fn length(&self) -> usize {
        self.length
    }
}
