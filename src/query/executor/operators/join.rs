// Multi-way Nested Loop Join
//
// Produces the cross product of N children in declared order. The last child
// is the innermost loop; an exhausted child is rewound and its predecessor
// advanced, like an odometer. Filtering is left to an enclosing Predicate.

use log::debug;

use crate::query::executor::operators::{
    close_all, current_of, Advance, BoxedOperator, Operator, OperatorState,
};
use crate::query::executor::result::{QueryResult, Row, RowSchema};

pub struct MultiJoin {
    children: Vec<BoxedOperator>,
    /// Current row of every child
    rows: Vec<Row>,
    started: bool,
    schema: RowSchema,
    current: Option<Row>,
    state: OperatorState,
}

impl MultiJoin {
    pub fn new(children: Vec<BoxedOperator>) -> Self {
        let schema = RowSchema::concat(children.iter().map(|c| c.schema()));
        MultiJoin {
            children,
            rows: Vec::new(),
            started: false,
            schema,
            current: None,
            state: OperatorState::Unopened,
        }
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Pull the next row of child `i` into `rows[i]`
    fn pull(&mut self, i: usize) -> QueryResult<Advance> {
        let child = &mut self.children[i];
        if child.next()? == Advance::Eof {
            return Ok(Advance::Eof);
        }
        let row = current_of(child.as_ref())?.clone();
        if i < self.rows.len() {
            self.rows[i] = row;
        } else {
            self.rows.push(row);
        }
        Ok(Advance::Row)
    }

    fn advance(&mut self) -> QueryResult<Advance> {
        self.current = None;
        if self.children.is_empty() {
            return Ok(Advance::Eof);
        }

        if !self.started {
            self.started = true;
            self.rows.clear();
            for i in 0..self.children.len() {
                if self.pull(i)? == Advance::Eof {
                    return Ok(Advance::Eof);
                }
            }
        } else {
            let mut i = self.children.len() - 1;
            while self.pull(i)? == Advance::Eof {
                if i == 0 {
                    return Ok(Advance::Eof);
                }
                // Restart this loop level and carry into the next outer one
                self.children[i].rewind()?;
                if self.pull(i)? == Advance::Eof {
                    return Ok(Advance::Eof);
                }
                i -= 1;
            }
        }

        let values = self.rows.iter().flat_map(|r| r.values.iter().cloned()).collect();
        self.current = Some(Row::new(values));
        Ok(Advance::Row)
    }
}

impl Operator for MultiJoin {
    fn open(&mut self) -> QueryResult<()> {
        self.state.check_open(self.name())?;
        let mut result = Ok(());
        for child in &mut self.children {
            result = child.open();
            if result.is_err() {
                break;
            }
        }
        debug!("MultiJoin opened over {} children", self.children.len());
        self.state.track_open(result)
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
        if !self.state.begin_close() {
            return Ok(());
        }
        self.current = None;
        self.rows.clear();
        close_all(self.children.iter_mut())
    }

    fn rewind(&mut self) -> QueryResult<()> {
        self.state.check_rewind(self.name())?;
        for child in &mut self.children {
            child.rewind()?;
        }
        self.started = false;
        self.current = None;
        self.state = OperatorState::Opened;
        Ok(())
    }

    fn attach_child(&mut self, child: BoxedOperator) -> QueryResult<()> {
        self.state.check_open(self.name())?;
        self.schema = RowSchema::concat(
            self.children.iter().map(|c| c.schema()).chain(std::iter::once(child.schema())),
        );
        self.children.push(child);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MultiJoin"
    }
}
