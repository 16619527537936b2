// Projection Operator Implementation
//
// This module implements the projection operator: plain columns copied by
// position, followed by computed expressions evaluated per row.

use crate::query::ast::{ColumnReference, Expression};
use crate::query::executor::expression_eval::evaluate_expression;
use crate::query::executor::operators::{
    current_of, Advance, BoxedOperator, ChildSlot, Operator, OperatorState,
};
use crate::query::executor::result::{CellSpec, QueryError, QueryResult, Row, RowSchema};

/// One output cell of a projection
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Column { column: ColumnReference, label: String },
    Expression { expr: Expression, label: String },
}

impl Projection {
    pub fn label(&self) -> &str {
        match self {
            Projection::Column { label, .. } | Projection::Expression { label, .. } => label,
        }
    }
}

/// Projection operator that selects columns and computes expressions
pub struct Project {
    child: ChildSlot,
    projections: Vec<Projection>,
    /// Source position of each plain column, resolved at open
    positions: Vec<Option<usize>>,
    schema: RowSchema,
    current: Option<Row>,
    state: OperatorState,
}

impl Project {
    pub fn new(child: BoxedOperator) -> Self {
        Project {
            child: ChildSlot::new(Some(child)),
            projections: Vec::new(),
            positions: Vec::new(),
            schema: RowSchema::default(),
            current: None,
            state: OperatorState::Unopened,
        }
    }

    /// Add a plain column. Plain columns always precede expressions in the output.
    pub fn add_projection(&mut self, column: ColumnReference, label: impl Into<String>) {
        let at = self
            .projections
            .iter()
            .position(|p| matches!(p, Projection::Expression { .. }))
            .unwrap_or(self.projections.len());
        self.projections.insert(at, Projection::Column { column, label: label.into() });
    }

    /// Add a computed expression labelled by its rendering
    pub fn add_expression(&mut self, expr: Expression) {
        let label = expr.to_string();
        self.projections.push(Projection::Expression { expr, label });
    }

    pub fn labels(&self) -> Vec<String> {
        self.projections.iter().map(|p| p.label().to_string()).collect()
    }

    fn resolve(&mut self) -> QueryResult<()> {
        let source = self.child.schema();
        let mut positions = Vec::with_capacity(self.projections.len());
        let mut cells = Vec::with_capacity(self.projections.len());
        for projection in &self.projections {
            match projection {
                Projection::Column { column, label } => {
                    let pos = source.position(column.table.as_deref(), &column.name)?;
                    cells.push(source.cells[pos].clone().with_label(label.clone()));
                    positions.push(Some(pos));
                }
                Projection::Expression { label, .. } => {
                    cells.push(CellSpec::computed(label.clone()));
                    positions.push(None);
                }
            }
        }
        self.positions = positions;
        self.schema = RowSchema::new(cells);
        Ok(())
    }

    fn advance(&mut self) -> QueryResult<Advance> {
        self.current = None;
        let child = self.child.get_mut("Project")?;
        if child.next()? == Advance::Eof {
            return Ok(Advance::Eof);
        }
        let source = current_of(child.as_ref())?;
        let mut values = Vec::with_capacity(self.projections.len());
        for (projection, position) in self.projections.iter().zip(&self.positions) {
            let value = match (projection, position) {
                (Projection::Expression { expr, .. }, _) => {
                    evaluate_expression(expr, source, child.schema())?
                }
                (Projection::Column { label, .. }, Some(pos)) => {
                    source.get(*pos).cloned().ok_or_else(|| {
                        QueryError::Internal(format!("source row too short for {}", label))
                    })?
                }
                (Projection::Column { label, .. }, None) => {
                    return Err(QueryError::Internal(format!("column {} not resolved", label)));
                }
            };
            values.push(value);
        }
        self.current = Some(Row { values, rid: source.rid });
        Ok(Advance::Row)
    }
}

impl Operator for Project {
    fn open(&mut self) -> QueryResult<()> {
        self.state.check_open(self.name())?;
        let result = self
            .child
            .get_mut("Project")
            .and_then(|child| child.open())
            .and_then(|_| self.resolve());
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
        self.child.close()
    }

    fn rewind(&mut self) -> QueryResult<()> {
        self.state.check_rewind(self.name())?;
        self.child.get_mut("Project")?.rewind()?;
        self.current = None;
        self.state = OperatorState::Opened;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Project"
    }
}
