// Ordered Index Implementation
//
// Single-column secondary index mapping keys to the set of record ids
// holding that key, with bounded range iteration.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use crate::common::types::Rid;
use crate::common::Value;
use crate::storage::error::StorageError;

/// One side of a scan range
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBound {
    pub value: Value,
    pub inclusive: bool,
}

impl IndexBound {
    pub fn inclusive(value: Value) -> Self {
        IndexBound { value, inclusive: true }
    }

    pub fn exclusive(value: Value) -> Self {
        IndexBound { value, inclusive: false }
    }

    fn as_bound(&self) -> Bound<&Value> {
        if self.inclusive {
            Bound::Included(&self.value)
        } else {
            Bound::Excluded(&self.value)
        }
    }
}

/// Key range of an index scan; a missing side is unbounded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRange {
    pub low: Option<IndexBound>,
    pub high: Option<IndexBound>,
}

impl ScanRange {
    /// Range matching exactly one key
    pub fn point(value: Value) -> Self {
        ScanRange {
            low: Some(IndexBound::inclusive(value.clone())),
            high: Some(IndexBound::inclusive(value)),
        }
    }

    /// True when no key can satisfy both bounds
    pub fn is_empty(&self) -> bool {
        match (&self.low, &self.high) {
            (Some(low), Some(high)) => match low.value.cmp(&high.value) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => !(low.inclusive && high.inclusive),
                std::cmp::Ordering::Less => false,
            },
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct OrderedIndex {
    pub name: String,
    /// Position of the indexed column in stored records
    pub column: usize,
    pub unique: bool,
    entries: BTreeMap<Value, BTreeSet<Rid>>,
}

impl OrderedIndex {
    pub fn new(name: impl Into<String>, column: usize, unique: bool) -> Self {
        OrderedIndex {
            name: name.into(),
            column,
            unique,
            entries: BTreeMap::new(),
        }
    }

    /// Fail if inserting `key` for `rid` would break uniqueness
    pub fn check_insert(&self, key: &Value, rid: Option<Rid>) -> Result<(), StorageError> {
        if !self.unique {
            return Ok(());
        }
        match self.entries.get(key) {
            Some(rids) if rids.iter().any(|r| Some(*r) != rid) => Err(StorageError::DuplicateKey {
                index: self.name.clone(),
                key: key.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn insert(&mut self, key: Value, rid: Rid) -> Result<(), StorageError> {
        self.check_insert(&key, Some(rid))?;
        self.entries.entry(key).or_default().insert(rid);
        Ok(())
    }

    pub fn remove(&mut self, key: &Value, rid: Rid) {
        if let Some(rids) = self.entries.get_mut(key) {
            rids.remove(&rid);
            if rids.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    /// Record ids whose keys fall inside `range`, in key order
    pub fn range(&self, range: &ScanRange) -> Vec<Rid> {
        if range.is_empty() {
            return Vec::new();
        }
        let low = range.low.as_ref().map_or(Bound::Unbounded, IndexBound::as_bound);
        let high = range.high.as_ref().map_or(Bound::Unbounded, IndexBound::as_bound);
        self.entries
            .range::<Value, _>((low, high))
            .flat_map(|(_, rids)| rids.iter().copied())
            .collect()
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }
}
