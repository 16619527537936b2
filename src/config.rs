// Engine Configuration
//
// Knobs of the execution engine, settable from the CLI or by embedding code.

use serde::{Deserialize, Serialize};

use crate::common::value::DEFAULT_FLOAT_PRECISION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Let single-table statements use an index range scan when one applies
    pub enable_index_scan: bool,
    /// Decimals kept when rendering floats, before trailing zeros are trimmed
    pub float_precision: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            enable_index_scan: true,
            float_precision: DEFAULT_FLOAT_PRECISION,
        }
    }
}

impl EngineConfig {
    pub fn without_index_scan(mut self) -> Self {
        self.enable_index_scan = false;
        self
    }

    pub fn with_float_precision(mut self, precision: usize) -> Self {
        self.float_precision = precision;
        self
    }
}
