// Statement Binder
//
// Resolves column references of a statement against its FROM tables before
// any operator is built, and decides which table a condition belongs to.

use crate::catalog::{DataType, Table};
use crate::common::Value;
use crate::query::ast::{
    AggregateTarget, AggregationSpec, ColumnReference, Condition, Expression, FilterSet,
    SelectColumn,
};
use crate::query::executor::result::{QueryError, QueryResult};

/// A column reference resolved to one FROM table
#[derive(Debug, Clone, PartialEq)]
pub struct BoundColumn {
    /// Position of the table in the FROM list
    pub table_index: usize,
    pub table: String,
    pub column: String,
}

impl BoundColumn {
    /// Fully qualified reference, never ambiguous downstream
    pub fn reference(&self) -> ColumnReference {
        ColumnReference::qualified(self.table.clone(), self.column.clone())
    }
}

pub struct Binder<'a> {
    tables: &'a [Table],
}

impl<'a> Binder<'a> {
    pub fn new(tables: &'a [Table]) -> Self {
        Binder { tables }
    }

    pub fn is_multi_table(&self) -> bool {
        self.tables.len() > 1
    }

    fn table_index(&self, name: &str) -> QueryResult<usize> {
        self.tables
            .iter()
            .position(|t| t.name() == name)
            .ok_or_else(|| QueryError::InvalidArgument(format!("table {} is not in the FROM list", name)))
    }

    /// Resolve a reference. Unqualified names must match exactly one table.
    pub fn resolve(&self, col: &ColumnReference) -> QueryResult<BoundColumn> {
        if let Some(table) = &col.table {
            let idx = self.table_index(table)?;
            if self.tables[idx].get_column(&col.name).is_none() {
                return Err(QueryError::InvalidArgument(format!("field not found: {}", col)));
            }
            return Ok(self.bound(idx, &col.name));
        }

        let mut matches = self
            .tables
            .iter()
            .enumerate()
            .filter(|(_, t)| t.get_column(&col.name).is_some())
            .map(|(i, _)| i);
        match (matches.next(), matches.next()) {
            (Some(idx), None) => Ok(self.bound(idx, &col.name)),
            (Some(_), Some(_)) => Err(QueryError::InvalidArgument(format!("ambiguous field: {}", col.name))),
            (None, _) => Err(QueryError::InvalidArgument(format!("field not found: {}", col.name))),
        }
    }

    fn bound(&self, idx: usize, column: &str) -> BoundColumn {
        BoundColumn {
            table_index: idx,
            table: self.tables[idx].name().to_string(),
            column: column.to_string(),
        }
    }

    pub fn check_expression(&self, expr: &Expression) -> QueryResult<()> {
        for col in expr.columns() {
            self.resolve(col)?;
        }
        Ok(())
    }

    pub fn check_filter(&self, filter: &FilterSet) -> QueryResult<()> {
        for cond in filter.iter() {
            self.check_expression(&cond.left)?;
            self.check_expression(&cond.right)?;
        }
        Ok(())
    }

    /// Check `filter` and return it with text literals compared against date
    /// columns rewritten to canonical dates, so predicates and index lookups
    /// see the same form as stored values
    pub fn bind_filter(&self, filter: &FilterSet) -> QueryResult<FilterSet> {
        self.check_filter(filter)?;
        let mut conditions = Vec::with_capacity(filter.conditions.len());
        for cond in filter.iter() {
            let mut cond = cond.clone();
            if self.is_date_column(&cond.left)? {
                normalize_date_literal(&mut cond.right)?;
            }
            if self.is_date_column(&cond.right)? {
                normalize_date_literal(&mut cond.left)?;
            }
            conditions.push(cond);
        }
        Ok(FilterSet::new(conditions))
    }

    fn is_date_column(&self, expr: &Expression) -> QueryResult<bool> {
        let Expression::Column(col) = expr else {
            return Ok(false);
        };
        let bound = self.resolve(col)?;
        Ok(self.tables[bound.table_index]
            .get_column(&bound.column)
            .is_some_and(|c| c.data_type() == DataType::Date))
    }

    pub fn check_aggregation(&self, spec: &AggregationSpec) -> QueryResult<()> {
        match &spec.target {
            AggregateTarget::Star => Ok(()),
            AggregateTarget::Column(col) => self.resolve(col).map(|_| ()),
        }
    }

    /// The single table every column of `cond` belongs to, if there is one
    pub fn condition_table(&self, cond: &Condition) -> QueryResult<Option<usize>> {
        let mut owner = None;
        for col in cond.left.columns().into_iter().chain(cond.right.columns()) {
            let idx = self.resolve(col)?.table_index;
            match owner {
                None => owner = Some(idx),
                Some(prev) if prev != idx => return Ok(None),
                Some(_) => {}
            }
        }
        Ok(owner)
    }

    /// Conditions that can be evaluated against table `idx` alone
    pub fn filter_for_table(&self, filter: &FilterSet, idx: usize) -> QueryResult<FilterSet> {
        let mut conditions = Vec::new();
        for cond in filter.iter() {
            if self.condition_table(cond)? == Some(idx) {
                conditions.push(cond.clone());
            }
        }
        Ok(FilterSet::new(conditions))
    }

    /// Header label of a plain column
    pub fn label(&self, bound: &BoundColumn, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => alias.to_string(),
            None if self.is_multi_table() => format!("{}.{}", bound.table, bound.column),
            None => bound.column.clone(),
        }
    }

    /// Expand the projection list into bound columns and labels, `*` in FROM order
    pub fn expand_columns(&self, columns: &[SelectColumn]) -> QueryResult<Vec<(BoundColumn, String)>> {
        let mut out = Vec::new();
        for select in columns {
            match select {
                SelectColumn::Wildcard { table } => {
                    let indexes: Vec<usize> = match table {
                        Some(name) => vec![self.table_index(name)?],
                        None => (0..self.tables.len()).collect(),
                    };
                    for idx in indexes {
                        for col in self.tables[idx].columns() {
                            let bound = self.bound(idx, col.name());
                            let label = self.label(&bound, None);
                            out.push((bound, label));
                        }
                    }
                }
                SelectColumn::Column { column, alias } => {
                    let bound = self.resolve(column)?;
                    let label = self.label(&bound, alias.as_deref());
                    out.push((bound, label));
                }
            }
        }
        Ok(out)
    }
}

fn normalize_date_literal(expr: &mut Expression) -> QueryResult<()> {
    if let Expression::Literal(Value::Text(text)) = expr {
        let date = Value::date(text)?;
        *expr = Expression::Literal(date);
    }
    Ok(())
}
