// Index Scan Operator
//
// Emits the records whose indexed key lies inside a scan range, in key order.
// Rows have the same shape as a table scan over the same table.

use std::sync::Arc;

use log::debug;

use crate::catalog::{IndexMeta, Table};
use crate::query::executor::operators::scan::{table_schema, RecordCursor};
use crate::query::executor::operators::{Advance, Operator, OperatorState};
use crate::query::executor::result::{QueryResult, Row, RowSchema};
use crate::storage::{ScanRange, StorageEngine};

pub struct IndexScan {
    storage: Arc<StorageEngine>,
    table_name: String,
    index: IndexMeta,
    range: ScanRange,
    schema: RowSchema,
    cursor: Option<RecordCursor>,
    current: Option<Row>,
    state: OperatorState,
}

impl IndexScan {
    pub fn new(storage: Arc<StorageEngine>, table: &Table, index: IndexMeta, range: ScanRange) -> Self {
        IndexScan {
            storage,
            table_name: table.name().to_string(),
            index,
            range,
            schema: table_schema(table),
            cursor: None,
            current: None,
            state: OperatorState::Unopened,
        }
    }

    pub fn index(&self) -> &IndexMeta {
        &self.index
    }

    pub fn range(&self) -> &ScanRange {
        &self.range
    }
}

impl Operator for IndexScan {
    fn open(&mut self) -> QueryResult<()> {
        self.state.check_open(self.name())?;
        let result = self
            .storage
            .index_range(&self.table_name, &self.index.name, &self.range)
            .map(|rids| {
                let cursor = RecordCursor::new(self.storage.clone(), &self.table_name, rids);
                debug!("IndexScan on {}.{}: {} candidates", self.table_name, self.index.name, cursor.len());
                self.cursor = Some(cursor);
            });
        self.state.track_open(result.map_err(Into::into))
    }

    fn next(&mut self) -> QueryResult<Advance> {
        if let Some(done) = self.state.check_next(self.name())? {
            self.current = None;
            return Ok(done);
        }
        let outcome = match self.cursor.as_mut() {
            Some(cursor) => cursor.next_record(),
            None => Ok(None),
        };
        let outcome = outcome.map(|row| {
            self.current = row;
            if self.current.is_some() { Advance::Row } else { Advance::Eof }
        });
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
        "IndexScan"
    }
}
