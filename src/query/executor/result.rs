// Query Result Implementation
//
// This module defines the error type of the executor and the rows and row
// schemas that flow between operators.

use thiserror::Error;

use crate::common::types::Rid;
use crate::common::Value;
use crate::storage::StorageError;

/// Represents query execution error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Unresolved or ambiguous field, or a value that does not fit its column
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Operator contract violation
    #[error("Internal error: {0}")]
    Internal(String),
    /// Referenced table or index does not exist
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),
    /// Table or index already exists
    #[error("Schema already exists: {0}")]
    SchemaExists(String),
    /// Malformed statement reaching a handler
    #[error("Generic error: {0}")]
    Generic(String),
    /// Error in comparing or combining values of incompatible kinds
    #[error("Type error: {0}")]
    TypeError(String),
    /// Numeric overflow
    #[error("Numeric overflow")]
    NumericOverflow,
    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,
    /// Error from storage layer
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Describes one cell of the rows an operator produces
#[derive(Debug, Clone, PartialEq)]
pub struct CellSpec {
    /// Source table, `None` for computed cells
    pub table: Option<String>,
    /// Source column name, or the rendered expression for computed cells
    pub name: String,
    /// Header label
    pub label: String,
}

impl CellSpec {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        CellSpec { table: Some(table.into()), label: name.clone(), name }
    }

    pub fn computed(label: impl Into<String>) -> Self {
        let label = label.into();
        CellSpec { table: None, name: label.clone(), label }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Ordered cell descriptions of an operator's output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSchema {
    pub cells: Vec<CellSpec>,
}

impl RowSchema {
    pub fn new(cells: Vec<CellSpec>) -> Self {
        RowSchema { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Concatenation of several schemas, in order
    pub fn concat<'a>(schemas: impl IntoIterator<Item = &'a RowSchema>) -> Self {
        RowSchema {
            cells: schemas.into_iter().flat_map(|s| s.cells.iter().cloned()).collect(),
        }
    }

    /// Position of a column cell. An unqualified name must match exactly one cell.
    pub fn position(&self, table: Option<&str>, name: &str) -> QueryResult<usize> {
        let mut found = None;
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.table.is_none() || cell.name != name {
                continue;
            }
            if table.is_some_and(|t| cell.table.as_deref() != Some(t)) {
                continue;
            }
            if found.is_some() {
                return Err(QueryError::InvalidArgument(format!("ambiguous field: {}", name)));
            }
            found = Some(i);
        }
        found.ok_or_else(|| match table {
            Some(t) => QueryError::InvalidArgument(format!("field not found: {}.{}", t, name)),
            None => QueryError::InvalidArgument(format!("field not found: {}", name)),
        })
    }

    pub fn labels(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.label.clone()).collect()
    }
}

/// Represents a row flowing between operators
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// Cells, in the producing operator's schema order
    pub values: Vec<Value>,
    /// Storage location when the row comes straight from one table
    pub rid: Option<Rid>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row { values, rid: None }
    }

    pub fn with_rid(values: Vec<Value>, rid: Rid) -> Self {
        Row { values, rid: Some(rid) }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
