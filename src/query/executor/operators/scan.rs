// Table Scan Operator
//
// This module implements the full table scan and the record cursor it shares
// with the index scan.

use std::sync::Arc;

use log::debug;

use crate::catalog::Table;
use crate::common::types::Rid;
use crate::query::executor::operators::{Advance, Operator, OperatorState};
use crate::query::executor::result::{CellSpec, QueryResult, Row, RowSchema};
use crate::storage::StorageEngine;

/// Schema of rows read straight from `table`
pub fn table_schema(table: &Table) -> RowSchema {
    RowSchema::new(
        table
            .columns()
            .iter()
            .map(|col| CellSpec::column(table.name(), col.name()))
            .collect(),
    )
}

/// Walks a snapshot of record ids, skipping records deleted since the snapshot
pub(crate) struct RecordCursor {
    storage: Arc<StorageEngine>,
    table: String,
    rids: Vec<Rid>,
    position: usize,
}

impl RecordCursor {
    pub(crate) fn new(storage: Arc<StorageEngine>, table: &str, rids: Vec<Rid>) -> Self {
        RecordCursor { storage, table: table.to_string(), rids, position: 0 }
    }

    pub(crate) fn next_record(&mut self) -> QueryResult<Option<Row>> {
        while let Some(&rid) = self.rids.get(self.position) {
            self.position += 1;
            if let Some(values) = self.storage.get_record(&self.table, rid)? {
                return Ok(Some(Row::with_rid(values, rid)));
            }
        }
        Ok(None)
    }

    pub(crate) fn rewind(&mut self) {
        self.position = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.rids.len()
    }
}

/// A table scan operator that emits every live record of a table once
pub struct TableScan {
    storage: Arc<StorageEngine>,
    table_name: String,
    schema: RowSchema,
    cursor: Option<RecordCursor>,
    current: Option<Row>,
    state: OperatorState,
}

impl TableScan {
    pub fn new(storage: Arc<StorageEngine>, table: &Table) -> Self {
        TableScan {
            storage,
            table_name: table.name().to_string(),
            schema: table_schema(table),
            cursor: None,
            current: None,
            state: OperatorState::Unopened,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn advance(&mut self) -> QueryResult<Advance> {
        self.current = match self.cursor.as_mut() {
            Some(cursor) => cursor.next_record()?,
            None => None,
        };
        Ok(if self.current.is_some() { Advance::Row } else { Advance::Eof })
    }
}

impl Operator for TableScan {
    fn open(&mut self) -> QueryResult<()> {
        self.state.check_open(self.name())?;
        let result = self.storage.record_ids(&self.table_name).map(|rids| {
            debug!("TableScan on {}: {} records", self.table_name, rids.len());
            self.cursor = Some(RecordCursor::new(self.storage.clone(), &self.table_name, rids));
        });
        self.state.track_open(result.map_err(Into::into))
    }

    fn next(&mut self) -> QueryResult<Advance> {
        if let Some(done) = self.state.check_next(self.name())? {
            self.current = None;
            return Ok(done);
        }
        let outcome = self.advance();
        if outcome.is_err() {
            self.current = None;
        }
        self.state.track(outcome)
    }

    fn current_row(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    fn schema(&self) -> &RowSchema {
        &self.schema
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.state.begin_close() {
            self.cursor = None;
            self.current = None;
        }
        Ok(())
    }

    fn rewind(&mut self) -> QueryResult<()> {
        self.state.check_rewind(self.name())?;
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.rewind();
        }
        self.current = None;
        self.state = OperatorState::Opened;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TableScan"
    }
}
