// Predicate Operator Implementation
//
// Passes through the child rows that satisfy every condition of a filter set.

use crate::query::ast::FilterSet;
use crate::query::executor::expression_eval::evaluate_filter;
use crate::query::executor::operators::{
    current_of, Advance, BoxedOperator, ChildSlot, Operator, OperatorState,
};
use crate::query::executor::result::{QueryResult, Row, RowSchema};

pub struct Predicate {
    child: ChildSlot,
    filter: FilterSet,
    /// Whether the child's current row passed the filter
    matched: bool,
    state: OperatorState,
}

impl Predicate {
    pub fn new(child: BoxedOperator, filter: FilterSet) -> Self {
        Predicate {
            child: ChildSlot::new(Some(child)),
            filter,
            matched: false,
            state: OperatorState::Unopened,
        }
    }

    /// Predicate whose child is attached later
    pub fn detached(filter: FilterSet) -> Self {
        Predicate {
            child: ChildSlot::default(),
            filter,
            matched: false,
            state: OperatorState::Unopened,
        }
    }

    pub fn filter(&self) -> &FilterSet {
        &self.filter
    }

    fn advance(&mut self) -> QueryResult<Advance> {
        let child = self.child.get_mut("Predicate")?;
        loop {
            if child.next()? == Advance::Eof {
                return Ok(Advance::Eof);
            }
            let row = current_of(child.as_ref())?;
            if evaluate_filter(&self.filter, row, child.schema())? {
                self.matched = true;
                return Ok(Advance::Row);
            }
        }
    }
}

impl Operator for Predicate {
    fn open(&mut self) -> QueryResult<()> {
        self.state.check_open(self.name())?;
        let result = self.child.get_mut("Predicate").and_then(|child| child.open());
        self.state.track_open(result)
    }

    fn next(&mut self) -> QueryResult<Advance> {
        self.matched = false;
        if let Some(done) = self.state.check_next(self.name())? {
            return Ok(done);
        }
        let outcome = self.advance();
        self.state.track(outcome)
    }

    fn current_row(&self) -> Option<&Row> {
        if !self.matched {
            return None;
        }
        self.child.get().and_then(|child| child.current_row())
    }

    fn schema(&self) -> &RowSchema {
        self.child.schema()
    }

    fn close(&mut self) -> QueryResult<()> {
        if !self.state.begin_close() {
            return Ok(());
        }
        self.matched = false;
        self.child.close()
    }

    fn rewind(&mut self) -> QueryResult<()> {
        self.state.check_rewind(self.name())?;
        self.child.get_mut("Predicate")?.rewind()?;
        self.matched = false;
        self.state = OperatorState::Opened;
        Ok(())
    }

    fn attach_child(&mut self, child: BoxedOperator) -> QueryResult<()> {
        self.child.attach(child, "Predicate")
    }

    fn name(&self) -> &'static str {
        "Predicate"
    }
}
