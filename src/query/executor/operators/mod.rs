// Query Operators Module
//
// This module defines the operators used for query execution in the
// iterator-based execution model.

pub mod aggregate;
pub mod delete;
pub mod index_scan;
pub mod join;
pub mod predicate;
pub mod project;
pub mod scan;
pub mod update;

pub use self::aggregate::{Aggregate, AggregateResult};
pub use self::delete::Delete;
pub use self::index_scan::IndexScan;
pub use self::join::MultiJoin;
pub use self::predicate::Predicate;
pub use self::project::{Project, Projection};
pub use self::scan::TableScan;
pub use self::update::Update;

use log::error;

use crate::query::executor::result::{QueryError, QueryResult, Row, RowSchema};

/// Outcome of a successful advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A row was produced (or, for sinks and aggregates, consumed)
    Row,
    /// No more rows
    Eof,
}

/// Operators are exclusively owned by their parent
pub type BoxedOperator = Box<dyn Operator>;

/// The Operator trait defines the interface for all query execution operators
/// in the iterator-based execution model. Each operator pulls rows from its
/// children and exposes the current one until the following advance.
pub trait Operator: Send {
    /// Prepare iteration, opening children first. Called once.
    fn open(&mut self) -> QueryResult<()>;

    /// Advance to the next row
    fn next(&mut self) -> QueryResult<Advance>;

    /// Row produced by the last successful advance
    fn current_row(&self) -> Option<&Row>;

    /// Shape of the rows this operator produces
    fn schema(&self) -> &RowSchema;

    /// Release resources, children included. Idempotent.
    fn close(&mut self) -> QueryResult<()>;

    /// Restart iteration from the first row
    fn rewind(&mut self) -> QueryResult<()> {
        Err(QueryError::Internal(format!("{} cannot rewind", self.name())))
    }

    /// Transfer ownership of `child` to this operator
    fn attach_child(&mut self, _child: BoxedOperator) -> QueryResult<()> {
        Err(QueryError::Internal(format!("{} takes no children", self.name())))
    }

    fn name(&self) -> &'static str;
}

/// Lifecycle of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorState {
    #[default]
    Unopened,
    Opened,
    Exhausted,
    Errored,
    Closed,
}

impl OperatorState {
    /// Fail unless the operator has never been opened
    pub fn check_open(&self, name: &str) -> QueryResult<()> {
        match self {
            OperatorState::Unopened => Ok(()),
            other => Err(QueryError::Internal(format!("{} opened while {:?}", name, other))),
        }
    }

    /// Record the outcome of `open()`
    pub fn track_open(&mut self, result: QueryResult<()>) -> QueryResult<()> {
        *self = if result.is_ok() { OperatorState::Opened } else { OperatorState::Errored };
        result
    }

    /// `Some(Eof)` once exhausted, `None` when the operator may advance
    pub fn check_next(&self, name: &str) -> QueryResult<Option<Advance>> {
        match self {
            OperatorState::Opened => Ok(None),
            OperatorState::Exhausted => Ok(Some(Advance::Eof)),
            other => Err(QueryError::Internal(format!("{} advanced while {:?}", name, other))),
        }
    }

    /// Record the outcome of an advance
    pub fn track(&mut self, outcome: QueryResult<Advance>) -> QueryResult<Advance> {
        match &outcome {
            Ok(Advance::Row) => {}
            Ok(Advance::Eof) => *self = OperatorState::Exhausted,
            Err(_) => *self = OperatorState::Errored,
        }
        outcome
    }

    /// Fail unless iteration can restart from here
    pub fn check_rewind(&self, name: &str) -> QueryResult<()> {
        match self {
            OperatorState::Opened | OperatorState::Exhausted => Ok(()),
            other => Err(QueryError::Internal(format!("{} rewound while {:?}", name, other))),
        }
    }

    /// Move to `Closed`; false if it already was
    pub fn begin_close(&mut self) -> bool {
        if *self == OperatorState::Closed {
            return false;
        }
        *self = OperatorState::Closed;
        true
    }
}

pub(crate) static EMPTY_SCHEMA: RowSchema = RowSchema { cells: Vec::new() };

/// Current row of a child that just reported `Advance::Row`
pub(crate) fn current_of(child: &dyn Operator) -> QueryResult<&Row> {
    child.current_row().ok_or_else(|| {
        error!("{} reported a row but produced none", child.name());
        QueryError::Internal(format!("{} reported a row but produced none", child.name()))
    })
}

/// Close every operator, returning the first error
pub(crate) fn close_all<'a>(ops: impl IntoIterator<Item = &'a mut BoxedOperator>) -> QueryResult<()> {
    let mut first = Ok(());
    for op in ops {
        if let Err(e) = op.close() {
            if first.is_ok() {
                first = Err(e);
            }
        }
    }
    first
}

/// The single input of a unary operator
#[derive(Default)]
pub(crate) struct ChildSlot(Option<BoxedOperator>);

impl ChildSlot {
    pub(crate) fn new(child: Option<BoxedOperator>) -> Self {
        ChildSlot(child)
    }

    pub(crate) fn attach(&mut self, child: BoxedOperator, owner: &str) -> QueryResult<()> {
        if self.0.is_some() {
            return Err(QueryError::Internal(format!("{} already has a child", owner)));
        }
        self.0 = Some(child);
        Ok(())
    }

    pub(crate) fn get(&self) -> Option<&BoxedOperator> {
        self.0.as_ref()
    }

    pub(crate) fn get_mut(&mut self, owner: &str) -> QueryResult<&mut BoxedOperator> {
        self.0
            .as_mut()
            .ok_or_else(|| QueryError::Internal(format!("{} has no child", owner)))
    }

    pub(crate) fn schema(&self) -> &RowSchema {
        self.0.as_ref().map_or(&EMPTY_SCHEMA, |c| c.schema())
    }

    pub(crate) fn close(&mut self) -> QueryResult<()> {
        close_all(self.0.as_mut())
    }
}
