// Storage Engine Implementation
//
// This module ties table heaps and their ordered indexes together and keeps
// index entries in step with every record mutation.

use std::collections::HashMap;

use log::debug;
use parking_lot::RwLock;

use crate::common::types::Rid;
use crate::common::Value;
use crate::storage::error::StorageError;
use crate::storage::heap::TableHeap;
use crate::storage::index::{OrderedIndex, ScanRange};

#[derive(Debug, Default)]
struct TableStore {
    heap: TableHeap,
    indexes: Vec<OrderedIndex>,
}

impl TableStore {
    fn index(&self, name: &str) -> Result<&OrderedIndex, StorageError> {
        self.indexes
            .iter()
            .find(|idx| idx.name == name)
            .ok_or_else(|| StorageError::IndexNotFound(name.to_string()))
    }
}

fn key_at(values: &[Value], column: usize) -> Result<&Value, StorageError> {
    values.get(column).ok_or(StorageError::InvalidColumn(column))
}

/// Record and index storage for every table
#[derive(Debug, Default)]
pub struct StorageEngine {
    tables: RwLock<HashMap<String, TableStore>>,
}

impl StorageEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&self, table: &str) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        if tables.contains_key(table) {
            return Err(StorageError::TableExists(table.to_string()));
        }
        tables.insert(table.to_string(), TableStore::default());
        debug!("Storage: created heap for table {}", table);
        Ok(())
    }

    /// Drop a table together with its records and indexes
    pub fn drop_table(&self, table: &str) -> Result<(), StorageError> {
        self.tables
            .write()
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    /// Create an index over `column` and populate it from existing records
    pub fn create_index(
        &self,
        table: &str,
        name: &str,
        column: usize,
        unique: bool,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        let store = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        if store.indexes.iter().any(|idx| idx.name == name) {
            return Err(StorageError::IndexExists(name.to_string()));
        }

        let mut index = OrderedIndex::new(name, column, unique);
        for record in store.heap.iter() {
            let (rid, values) = record?;
            index.insert(key_at(&values, column)?.clone(), rid)?;
        }
        debug!("Storage: built index {} on {} with {} keys", name, table, index.key_count());
        store.indexes.push(index);
        Ok(())
    }

    /// Insert a record, maintaining every index of the table
    pub fn insert_record(&self, table: &str, values: Vec<Value>) -> Result<Rid, StorageError> {
        let mut tables = self.tables.write();
        let store = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;

        // Check every index before touching anything
        for index in &store.indexes {
            index.check_insert(key_at(&values, index.column)?, None)?;
        }

        let rid = store.heap.insert(&values)?;
        for index in &mut store.indexes {
            index.insert(values[index.column].clone(), rid)?;
        }
        Ok(rid)
    }

    /// Fetch a record, or `None` if it has been deleted
    pub fn get_record(&self, table: &str, rid: Rid) -> Result<Option<Vec<Value>>, StorageError> {
        let tables = self.tables.read();
        let store = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        store.heap.get(rid)
    }

    /// Overwrite one column of a record in place
    pub fn update_record(
        &self,
        table: &str,
        rid: Rid,
        column: usize,
        value: Value,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        let store = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;

        let mut values = store.heap.get(rid)?.ok_or(StorageError::RecordNotFound(rid))?;
        let old = key_at(&values, column)?.clone();

        for index in store.indexes.iter().filter(|idx| idx.column == column) {
            index.check_insert(&value, Some(rid))?;
        }

        values[column] = value.clone();
        store.heap.replace(rid, &values)?;
        for index in store.indexes.iter_mut().filter(|idx| idx.column == column) {
            index.remove(&old, rid);
            index.insert(value.clone(), rid)?;
        }
        Ok(())
    }

    /// Remove a record and its index entries
    pub fn delete_record(&self, table: &str, rid: Rid) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        let store = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;

        let values = store.heap.remove(rid)?;
        for index in &mut store.indexes {
            index.remove(key_at(&values, index.column)?, rid);
        }
        Ok(())
    }

    /// Ids of every live record of the table, in insertion order
    pub fn record_ids(&self, table: &str) -> Result<Vec<Rid>, StorageError> {
        let tables = self.tables.read();
        let store = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        Ok(store.heap.record_ids())
    }

    /// Ids of records whose key in `index` lies inside `range`, in key order
    pub fn index_range(
        &self,
        table: &str,
        index: &str,
        range: &ScanRange,
    ) -> Result<Vec<Rid>, StorageError> {
        let tables = self.tables.read();
        let store = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        Ok(store.index(index)?.range(range))
    }

    pub fn record_count(&self, table: &str) -> Result<usize, StorageError> {
        let tables = self.tables.read();
        tables
            .get(table)
            .map(|store| store.heap.len())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }
}
