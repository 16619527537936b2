use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;
use parking_lot::RwLock;

use super::table::{IndexMeta, Table};
use crate::query::executor::result::{QueryError, QueryResult};

/// The Catalog is the central repository for all table and index metadata
pub struct Catalog {
    pub(crate) tables: RwLock<HashMap<String, Table>>,
    pub(crate) table_id_counter: AtomicU32,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            tables: RwLock::new(HashMap::new()),
            table_id_counter: AtomicU32::new(1),
        }
    }

    /// Register a table, assigning it a fresh id
    pub fn create_table(&self, mut table: Table) -> QueryResult<Table> {
        let mut tables = self.tables.write();
        if tables.contains_key(table.name()) {
            return Err(QueryError::SchemaExists(table.name().to_string()));
        }
        let new_id = self.table_id_counter.fetch_add(1, Ordering::SeqCst);
        table.set_id(new_id);
        debug!("Catalog: created table {} with id {}", table.name(), new_id);
        tables.insert(table.name().to_string(), table.clone());
        Ok(table)
    }

    pub fn drop_table(&self, name: &str) -> QueryResult<Table> {
        self.tables
            .write()
            .remove(name)
            .ok_or_else(|| QueryError::SchemaNotFound(name.to_string()))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Snapshot of a table's metadata
    pub fn table(&self, name: &str) -> QueryResult<Table> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::SchemaNotFound(name.to_string()))
    }

    /// Sorted table names
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Index declared on `table.column`, if any
    pub fn find_index(&self, table: &str, column: &str) -> Option<IndexMeta> {
        self.tables
            .read()
            .get(table)
            .and_then(|t| t.find_index_by_field(column).cloned())
    }

    pub fn add_index(&self, table: &str, index: IndexMeta) -> QueryResult<()> {
        let mut tables = self.tables.write();
        let meta = tables
            .get_mut(table)
            .ok_or_else(|| QueryError::SchemaNotFound(table.to_string()))?;
        meta.add_index(index)
    }
}
