//! Table Management Module
//!
//! This module defines the Table type that represents a database table schema
//! together with the indexes declared on it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::column::Column;
use crate::common::TableId;
use crate::query::executor::result::{QueryError, QueryResult};

/// Metadata of a single-column index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Index name, unique within its table
    pub name: String,
    /// Indexed column name
    pub column: String,
    /// Whether duplicate keys are rejected
    pub unique: bool,
}

/// Represents a database table schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Table ID (unique within the database)
    id: TableId,
    /// Table name
    name: String,
    /// Columns in the table
    columns: Vec<Column>,
    /// Column name to index lookup
    column_map: HashMap<String, usize>,
    /// Indexes declared on this table
    indexes: Vec<IndexMeta>,
}

impl Table {
    /// Create a new table with the given name and columns
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let column_map = columns
            .iter()
            .enumerate()
            .map(|(i, col)| (col.name().to_string(), i))
            .collect();

        Table {
            id: 0, // set by Catalog
            name: name.into(),
            columns,
            column_map,
            indexes: Vec::new(),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: TableId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.column_map.get(name).map(|&idx| &self.columns[idx])
    }

    /// Get the position of a column in stored records
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_map.get(name).copied()
    }

    pub fn indexes(&self) -> &[IndexMeta] {
        &self.indexes
    }

    /// Find the index declared on `column`, if any
    pub fn find_index_by_field(&self, column: &str) -> Option<&IndexMeta> {
        self.indexes.iter().find(|idx| idx.column == column)
    }

    /// Find an index by its name
    pub fn find_index(&self, name: &str) -> Option<&IndexMeta> {
        self.indexes.iter().find(|idx| idx.name == name)
    }

    pub(crate) fn add_index(&mut self, index: IndexMeta) -> QueryResult<()> {
        if self.find_index(&index.name).is_some() {
            return Err(QueryError::SchemaExists(format!("index {} on table {}", index.name, self.name)));
        }
        if !self.column_map.contains_key(&index.column) {
            return Err(QueryError::InvalidArgument(format!(
                "Column {} does not exist in table {}",
                index.column, self.name
            )));
        }
        self.indexes.push(index);
        Ok(())
    }

    /// Human readable description used by `DESC <table>`
    pub fn describe(&self) -> String {
        let mut out = format!("{}(\n", self.name);
        for col in &self.columns {
            out.push_str(&format!("\t{}:{}:{}\n", col.name(), col.data_type(), col.length()));
        }
        for idx in &self.indexes {
            let kind = if idx.unique { "unique index" } else { "index" };
            out.push_str(&format!("\t{} {}({})\n", kind, idx.name, idx.column));
        }
        out.push_str(")\n");
        out
    }
}
