// Single-group Aggregation Operator
//
// Folds every input row into one accumulator per aggregation and synthesizes
// a single result row once the child is exhausted. While input is still being
// consumed, `next()` reports `Advance::Row` with no current row.

use std::cmp::Ordering;

use log::debug;

use crate::common::Value;
use crate::query::ast::{AggregateKind, AggregateTarget, AggregationSpec};
use crate::query::executor::operators::{
    current_of, Advance, BoxedOperator, ChildSlot, Operator, OperatorState,
};
use crate::query::executor::result::{CellSpec, QueryError, QueryResult, Row, RowSchema};

/// Running state of one aggregation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    pub count: i64,
    pub sum: f64,
    /// Set at finalization
    pub avg: f64,
    /// Running minimum or maximum; `None` until a row is seen
    pub extremum: Option<Value>,
}

impl AggregateResult {
    fn update(&mut self, kind: AggregateKind, value: Option<&Value>) -> QueryResult<()> {
        self.count += 1;
        let Some(value) = value else {
            return Ok(());
        };
        match kind {
            AggregateKind::Count => {}
            AggregateKind::Avg => {
                self.sum += value.as_f64().ok_or_else(|| {
                    QueryError::TypeError(format!("cannot average {} values", value.data_type()))
                })?;
            }
            AggregateKind::Min | AggregateKind::Max => {
                let wanted = if kind == AggregateKind::Min { Ordering::Less } else { Ordering::Greater };
                let replace = match &self.extremum {
                    None => true,
                    Some(current) => value.compare(current)? == wanted,
                };
                if replace {
                    self.extremum = Some(value.clone());
                }
            }
        }
        Ok(())
    }

    fn finalize(&mut self) {
        self.avg = if self.count == 0 { 0.0 } else { self.sum / self.count as f64 };
    }

    /// Final value of the aggregation; MIN/MAX of no rows is empty text
    pub fn value(&self, kind: AggregateKind) -> QueryResult<Value> {
        Ok(match kind {
            AggregateKind::Count => {
                Value::Integer(i32::try_from(self.count).map_err(|_| QueryError::NumericOverflow)?)
            }
            AggregateKind::Avg => Value::Float(self.avg),
            AggregateKind::Min | AggregateKind::Max => {
                self.extremum.clone().unwrap_or_else(|| Value::text(""))
            }
        })
    }
}

pub struct Aggregate {
    child: ChildSlot,
    specs: Vec<AggregationSpec>,
    /// Input position of each target, `None` for `*`
    targets: Vec<Option<usize>>,
    results: Vec<AggregateResult>,
    schema: RowSchema,
    output: Option<Row>,
    state: OperatorState,
}

impl Aggregate {
    pub fn new(child: BoxedOperator, specs: Vec<AggregationSpec>) -> Self {
        let schema = RowSchema::new(specs.iter().map(|s| CellSpec::computed(s.label())).collect());
        let results = vec![AggregateResult::default(); specs.len()];
        Aggregate {
            child: ChildSlot::new(Some(child)),
            specs,
            targets: Vec::new(),
            results,
            schema,
            output: None,
            state: OperatorState::Unopened,
        }
    }

    /// Accumulators, final once the operator is exhausted
    pub fn results(&self) -> &[AggregateResult] {
        &self.results
    }

    /// The synthesized row, available after end of stream
    pub fn result_row(&self) -> Option<&Row> {
        self.output.as_ref()
    }

    fn resolve(&mut self) -> QueryResult<()> {
        let source = self.child.schema();
        let mut targets = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            match &spec.target {
                AggregateTarget::Star if spec.kind != AggregateKind::Count => {
                    return Err(QueryError::InvalidArgument(format!(
                        "{}(*) is not supported",
                        spec.kind.label()
                    )));
                }
                AggregateTarget::Star => targets.push(None),
                AggregateTarget::Column(col) => {
                    targets.push(Some(source.position(col.table.as_deref(), &col.name)?));
                }
            }
        }
        self.targets = targets;
        Ok(())
    }

    fn advance(&mut self) -> QueryResult<Advance> {
        let child = self.child.get_mut("Aggregate")?;
        if child.next()? == Advance::Eof {
            let mut values = Vec::with_capacity(self.specs.len());
            for (spec, result) in self.specs.iter().zip(self.results.iter_mut()) {
                result.finalize();
                values.push(result.value(spec.kind)?);
            }
            debug!("Aggregate finalized {} results", values.len());
            self.output = Some(Row::new(values));
            return Ok(Advance::Eof);
        }

        let row = current_of(child.as_ref())?;
        for ((spec, target), result) in self.specs.iter().zip(&self.targets).zip(self.results.iter_mut()) {
            let value = match target {
                Some(pos) => Some(row.get(*pos).ok_or_else(|| {
                    QueryError::Internal(format!("row too short for {}", spec.label()))
                })?),
                None => None,
            };
            result.update(spec.kind, value)?;
        }
        Ok(Advance::Row)
    }
}

impl Operator for Aggregate {
    fn open(&mut self) -> QueryResult<()> {
        self.state.check_open(self.name())?;
        let result = self
            .child
            .get_mut("Aggregate")
            .and_then(|child| child.open())
            .and_then(|_| self.resolve());
        self.state.track_open(result)
    }

    fn next(&mut self) -> QueryResult<Advance> {
        if let Some(done) = self.state.check_next(self.name())? {
            return Ok(done);
        }
        let outcome = self.advance();
        self.state.track(outcome)
    }

    /// Only the synthesized row, once the input is drained
    fn current_row(&self) -> Option<&Row> {
        if self.state == OperatorState::Exhausted {
            self.output.as_ref()
        } else {
            None
        }
    }

    fn schema(&self) -> &RowSchema {
        &self.schema
    }

    fn close(&mut self) -> QueryResult<()> {
        if !self.state.begin_close() {
            return Ok(());
        }
        self.child.close()
    }

    fn name(&self) -> &'static str {
        "Aggregate"
    }
}
