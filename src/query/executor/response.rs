// Statement Responses
//
// Text a client sees for a statement, plus the error behind a failure.

use crate::query::executor::result::{QueryError, Row};

pub const SUCCESS: &str = "SUCCESS\n";
pub const FAILURE: &str = "FAILURE\n";
pub const UNSUPPORTED: &str = "Unsupported\n";

const CELL_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Exactly what a client would see
    pub text: String,
    /// Failure behind the response, if any
    pub error: Option<QueryError>,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Response { text: text.into(), error: None }
    }

    pub fn success() -> Self {
        Self::text(SUCCESS)
    }

    pub fn failure(error: QueryError) -> Self {
        Response { text: FAILURE.to_string(), error: Some(error) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Lines of the response without their terminators
    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }
}

/// Builds the tabular text of a select
pub struct TableWriter {
    text: String,
    float_precision: usize,
}

impl TableWriter {
    pub fn new(float_precision: usize) -> Self {
        TableWriter { text: String::new(), float_precision }
    }

    /// Header line; nothing for zero columns
    pub fn header(&mut self, labels: &[String]) {
        if labels.is_empty() {
            return;
        }
        self.text.push_str(&labels.join(CELL_SEPARATOR));
        self.text.push('\n');
    }

    pub fn row(&mut self, row: &Row) {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|v| v.to_display_string(self.float_precision))
            .collect();
        self.text.push_str(&cells.join(CELL_SEPARATOR));
        self.text.push('\n');
    }

    pub fn finish(self, error: Option<QueryError>) -> Response {
        Response { text: self.text, error }
    }
}
