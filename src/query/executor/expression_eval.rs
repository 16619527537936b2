// Expression Evaluation Utility
//
// Evaluates arithmetic expressions and filter conditions against one row,
// resolving column references through the row's schema.

use log::trace;

use crate::common::Value;
use crate::query::ast::{ArithmeticOp, Comparator, Condition, Expression, FilterSet, SignOp};
use crate::query::executor::result::{QueryError, QueryResult, Row, RowSchema};

/// Evaluate an expression in the context of a single row.
pub fn evaluate_expression(expr: &Expression, row: &Row, schema: &RowSchema) -> QueryResult<Value> {
    match expr {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Column(col_ref) => {
            let pos = schema.position(col_ref.table.as_deref(), &col_ref.name)?;
            row.get(pos).cloned().ok_or_else(|| {
                QueryError::Internal(format!(
                    "row has {} cells, field {} expected at {}",
                    row.len(),
                    col_ref,
                    pos
                ))
            })
        }
        Expression::Binary { left, op, right } => {
            let l = evaluate_expression(left, row, schema)?;
            let r = evaluate_expression(right, row, schema)?;
            apply_arithmetic(*op, &l, &r)
        }
        Expression::Unary { op, operand } => {
            let v = evaluate_expression(operand, row, schema)?;
            apply_sign(*op, v)
        }
        Expression::Grouping(inner) => evaluate_expression(inner, row, schema),
    }
}

fn apply_arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> QueryResult<Value> {
    if !left.is_numeric() || !right.is_numeric() {
        return Err(QueryError::TypeError(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            left.data_type(),
            right.data_type()
        )));
    }

    match (op, left, right) {
        (ArithmeticOp::Divide, _, _) => {
            let (l, r) = (numeric(left)?, numeric(right)?);
            if r == 0.0 {
                return Err(QueryError::DivisionByZero);
            }
            Ok(Value::Float(l / r))
        }
        (_, Value::Integer(l), Value::Integer(r)) => {
            let result = match op {
                ArithmeticOp::Add => l.checked_add(*r),
                ArithmeticOp::Subtract => l.checked_sub(*r),
                _ => l.checked_mul(*r),
            };
            result.map(Value::Integer).ok_or(QueryError::NumericOverflow)
        }
        _ => {
            let (l, r) = (numeric(left)?, numeric(right)?);
            let result = match op {
                ArithmeticOp::Add => l + r,
                ArithmeticOp::Subtract => l - r,
                _ => l * r,
            };
            if result.is_finite() {
                Ok(Value::Float(result))
            } else {
                Err(QueryError::NumericOverflow)
            }
        }
    }
}

fn apply_sign(op: SignOp, value: Value) -> QueryResult<Value> {
    match (op, value) {
        (SignOp::Plus, v) if v.is_numeric() => Ok(v),
        (SignOp::Minus, Value::Integer(i)) => {
            i.checked_neg().map(Value::Integer).ok_or(QueryError::NumericOverflow)
        }
        (SignOp::Minus, Value::Float(f)) => Ok(Value::Float(-f)),
        (_, v) => Err(QueryError::TypeError(format!("cannot apply sign to {}", v.data_type()))),
    }
}

fn numeric(value: &Value) -> QueryResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| QueryError::TypeError(format!("{} is not numeric", value.data_type())))
}

/// Evaluate one comparison against a row
pub fn evaluate_condition(cond: &Condition, row: &Row, schema: &RowSchema) -> QueryResult<bool> {
    let left = evaluate_expression(&cond.left, row, schema)?;
    let right = evaluate_expression(&cond.right, row, schema)?;
    compare_values(&left, cond.comparator, &right)
}

/// Type-aware `left ⊙ right`
pub fn compare_values(left: &Value, comparator: Comparator, right: &Value) -> QueryResult<bool> {
    Ok(comparator.holds(left.compare(right)?))
}

/// Evaluate a conjunction, stopping at the first failing condition
pub fn evaluate_filter(filter: &FilterSet, row: &Row, schema: &RowSchema) -> QueryResult<bool> {
    for cond in filter.iter() {
        if !evaluate_condition(cond, row, schema)? {
            trace!("Row rejected by condition {}", cond);
            return Ok(false);
        }
    }
    Ok(true)
}
