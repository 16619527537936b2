// Access Path Selection
//
// Decides whether a single-table statement can be served by an index range
// scan instead of a full table scan.

use log::debug;

use crate::catalog::{IndexMeta, Table};
use crate::common::Value;
use crate::query::ast::{ColumnReference, Comparator, Condition, Expression, FilterSet};
use crate::storage::{IndexBound, ScanRange};

/// Chosen index and the key range to scan
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPlan {
    pub index: IndexMeta,
    /// Comparator as read `field ⊙ value`
    pub comparator: Comparator,
    pub value: Value,
    pub range: ScanRange,
}

/// Rewrite a condition as `field ⊙ value`, if it has that shape at all
fn normalize(cond: &Condition) -> Option<(&ColumnReference, Comparator, &Value)> {
    match (&cond.left, &cond.right) {
        (Expression::Column(col), Expression::Literal(v)) => Some((col, cond.comparator, v)),
        (Expression::Literal(v), Expression::Column(col)) => Some((col, cond.comparator.swapped(), v)),
        _ => None,
    }
}

/// Key range matching `field ⊙ value`
pub fn scan_range(comparator: Comparator, value: &Value) -> Option<ScanRange> {
    let range = match comparator {
        Comparator::Equal => ScanRange::point(value.clone()),
        Comparator::LessEqual => ScanRange { low: None, high: Some(IndexBound::inclusive(value.clone())) },
        Comparator::Less => ScanRange { low: None, high: Some(IndexBound::exclusive(value.clone())) },
        Comparator::GreaterEqual => ScanRange { low: Some(IndexBound::inclusive(value.clone())), high: None },
        Comparator::Greater => ScanRange { low: Some(IndexBound::exclusive(value.clone())), high: None },
        Comparator::NotEqual => return None,
    };
    Some(range)
}

fn candidate(cond: &Condition, table: &Table) -> Option<(IndexMeta, Comparator, Value)> {
    if cond.comparator == Comparator::NotEqual {
        return None;
    }
    let (col, comparator, value) = normalize(cond)?;
    if col.table.as_deref().is_some_and(|t| t != table.name()) {
        return None;
    }
    let column = table.get_column(&col.name)?;
    // A literal of the other kind would make the index disagree with the predicate
    if column.data_type().is_numeric() != value.is_numeric() {
        return None;
    }
    let index = table.find_index_by_field(&col.name)?;
    Some((index.clone(), comparator, value.clone()))
}

/// Pick an index for `filter` over `table`: the first equality candidate,
/// otherwise the first candidate of any kind.
pub fn select_access_path(filter: &FilterSet, table: &Table) -> Option<IndexPlan> {
    let mut chosen: Option<(IndexMeta, Comparator, Value)> = None;
    for cond in filter.iter() {
        let Some(found) = candidate(cond, table) else {
            continue;
        };
        if found.1 == Comparator::Equal {
            chosen = Some(found);
            break;
        }
        if chosen.is_none() {
            chosen = Some(found);
        }
    }

    let (index, comparator, value) = chosen?;
    let range = scan_range(comparator, &value)?;
    debug!("Access path on {}: {} {} {}", table.name(), index.column, comparator.symbol(), value);
    Some(IndexPlan { index, comparator, value, range })
}
