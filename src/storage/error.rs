use thiserror::Error;

use crate::common::types::Rid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Table {0} not found in storage")]
    TableNotFound(String),

    #[error("Table {0} already exists in storage")]
    TableExists(String),

    #[error("Record {0} not found")]
    RecordNotFound(Rid),

    #[error("Index {0} not found")]
    IndexNotFound(String),

    #[error("Index {0} already exists")]
    IndexExists(String),

    #[error("Duplicate key {key} in unique index {index}")]
    DuplicateKey { index: String, key: String },

    #[error("Column position {0} out of range")]
    InvalidColumn(usize),

    #[error("Record codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Codec(err.to_string())
    }
}
