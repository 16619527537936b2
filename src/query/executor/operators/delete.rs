// Delete Operator
//
// Terminal sink removing every record its child produces. Like Update, it
// collects the qualifying record ids before deleting any of them.

use std::sync::Arc;

use log::{debug, warn};

use crate::query::executor::operators::update::collect_rids;
use crate::query::executor::operators::{
    Advance, BoxedOperator, ChildSlot, Operator, OperatorState, EMPTY_SCHEMA,
};
use crate::query::executor::result::{QueryResult, Row, RowSchema};
use crate::storage::StorageEngine;

pub struct Delete {
    storage: Arc<StorageEngine>,
    child: ChildSlot,
    table_name: String,
    affected: usize,
    state: OperatorState,
}

impl Delete {
    pub fn new(storage: Arc<StorageEngine>, child: BoxedOperator, table_name: &str) -> Self {
        Delete {
            storage,
            child: ChildSlot::new(Some(child)),
            table_name: table_name.to_string(),
            affected: 0,
            state: OperatorState::Unopened,
        }
    }

    /// Rows deleted so far
    pub fn affected_rows(&self) -> usize {
        self.affected
    }

    fn run(&mut self) -> QueryResult<()> {
        let child = self.child.get_mut("Delete")?;
        child.open()?;
        let rids = collect_rids(child, "Delete")?;
        debug!("Delete on {}: {} qualifying rows", self.table_name, rids.len());

        for rid in rids {
            if let Err(e) = self.storage.delete_record(&self.table_name, rid) {
                warn!("Delete on {} stopped at record {}: {}", self.table_name, rid, e);
                return Err(e.into());
            }
            self.affected += 1;
        }
        Ok(())
    }
}

impl Operator for Delete {
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
        "Delete"
    }
}
