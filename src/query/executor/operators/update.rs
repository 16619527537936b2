// Update Operator
//
// Terminal sink assigning one value to one column of every row its child
// produces. All work happens in `open()`: qualifying record ids are collected
// first, then updated, so the scan never observes its own writes.

use std::sync::Arc;

use log::{debug, warn};

use crate::catalog::Table;
use crate::common::types::Rid;
use crate::common::Value;
use crate::query::executor::operators::{
    current_of, Advance, BoxedOperator, ChildSlot, Operator, OperatorState, EMPTY_SCHEMA,
};
use crate::query::executor::result::{QueryError, QueryResult, Row, RowSchema};
use crate::storage::StorageEngine;

/// Drain `child`, collecting the record id of every row
pub(crate) fn collect_rids(child: &mut BoxedOperator, owner: &str) -> QueryResult<Vec<Rid>> {
    let mut rids = Vec::new();
    while child.next()? == Advance::Row {
        let row = current_of(child.as_ref())?;
        let rid = row
            .rid
            .ok_or_else(|| QueryError::Internal(format!("{} input row has no record id", owner)))?;
        rids.push(rid);
    }
    Ok(rids)
}

pub struct Update {
    storage: Arc<StorageEngine>,
    child: ChildSlot,
    table_name: String,
    column: usize,
    value: Value,
    affected: usize,
    state: OperatorState,
}

impl Update {
    /// The value is coerced to the column type up front
    pub fn new(
        storage: Arc<StorageEngine>,
        child: BoxedOperator,
        table: &Table,
        column: &str,
        value: Value,
    ) -> QueryResult<Self> {
        let position = table.column_index(column).ok_or_else(|| {
            QueryError::InvalidArgument(format!("field not found: {}.{}", table.name(), column))
        })?;
        let value = value.coerce_to(&table.columns()[position])?;
        Ok(Update {
            storage,
            child: ChildSlot::new(Some(child)),
            table_name: table.name().to_string(),
            column: position,
            value,
            affected: 0,
            state: OperatorState::Unopened,
        })
    }

    /// Rows updated so far
    pub fn affected_rows(&self) -> usize {
        self.affected
    }

    fn run(&mut self) -> QueryResult<()> {
        let child = self.child.get_mut("Update")?;
        child.open()?;
        let rids = collect_rids(child, "Update")?;
        debug!("Update on {}: {} qualifying rows", self.table_name, rids.len());

        for rid in rids {
            if let Err(e) = self.storage.update_record(&self.table_name, rid, self.column, self.value.clone()) {
                warn!("Update on {} stopped at record {}: {}", self.table_name, rid, e);
                return Err(e.into());
            }
            self.affected += 1;
        }
        Ok(())
    }
}

impl Operator for Update {
    fn open(&mut self) -> QueryResult<()> {
        self.state.check_open(self.name())?;
        let result = self.run();
        self.state.track_open(result)
    }

    fn next(&mut self) -> QueryResult<Advance> {
        if let Some(done) = self.state.check_next(self.name())? {
            return Ok(done);
        }
        self.state.track(Ok(Advance::Eof))
    }

    fn current_row(&self) -> Option<&Row> {
        None
    }

    fn schema(&self) -> &RowSchema {
        &EMPTY_SCHEMA
    }

    fn close(&mut self) -> QueryResult<()> {
        if !self.state.begin_close() {
            return Ok(());
        }
        self.child.close()
    }

    fn name(&self) -> &'static str {
        "Update"
    }
}
