// Table Heap Implementation
//
// This module stores the records of one table as bincode-encoded byte
// strings keyed by their record id.

use std::collections::BTreeMap;

use crate::common::types::Rid;
use crate::common::Value;
use crate::storage::error::StorageError;

/// Encode a record for storage
pub fn encode_record(values: &[Value]) -> Result<Vec<u8>, StorageError> {
    Ok(bincode::serialize(values)?)
}

/// Decode a stored record
pub fn decode_record(bytes: &[u8]) -> Result<Vec<Value>, StorageError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Records of a single table, in record id order
#[derive(Debug, Default)]
pub struct TableHeap {
    records: BTreeMap<Rid, Vec<u8>>,
    next_rid: Rid,
}

impl TableHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return its id. Ids are never reused.
    pub fn insert(&mut self, values: &[Value]) -> Result<Rid, StorageError> {
        let bytes = encode_record(values)?;
        let rid = self.next_rid;
        self.next_rid += 1;
        self.records.insert(rid, bytes);
        Ok(rid)
    }

    pub fn get(&self, rid: Rid) -> Result<Option<Vec<Value>>, StorageError> {
        self.records.get(&rid).map(|bytes| decode_record(bytes)).transpose()
    }

    /// Replace the record stored under `rid`
    pub fn replace(&mut self, rid: Rid, values: &[Value]) -> Result<(), StorageError> {
        let bytes = encode_record(values)?;
        match self.records.get_mut(&rid) {
            Some(slot) => {
                *slot = bytes;
                Ok(())
            }
            None => Err(StorageError::RecordNotFound(rid)),
        }
    }

    pub fn remove(&mut self, rid: Rid) -> Result<Vec<Value>, StorageError> {
        let bytes = self.records.remove(&rid).ok_or(StorageError::RecordNotFound(rid))?;
        decode_record(&bytes)
    }

    /// Ids of every live record
    pub fn record_ids(&self) -> Vec<Rid> {
        self.records.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over every live record, decoding as it goes
    pub fn iter(&self) -> impl Iterator<Item = Result<(Rid, Vec<Value>), StorageError>> + '_ {
        self.records
            .iter()
            .map(|(rid, bytes)| decode_record(bytes).map(|values| (*rid, values)))
    }
}
