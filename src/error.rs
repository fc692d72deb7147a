//! Structured errors returned by the table core.
//!
//! Every variant is recoverable: the caller fixes the input and tries again.

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TableError {
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column `{column}` row {row}: `{value}` is not a number")]
    TypeMismatch {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column `{0}` has no usable values")]
    EmptyColumn(String),

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("column `{0}` is both an identifier and a value column")]
    OverlappingColumns(String),

    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),

    #[error("column `{column}` has {found} cells, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("schema `{0}` has no columns")]
    EmptySchema(String),

    #[error("no rows where `{column}` = `{value}`")]
    EmptySelection { column: String, value: String },
}

impl TableError {
    /// Column names carried by the error, for highlighting in a UI.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            TableError::MissingColumns(cols) => cols.iter().map(String::as_str).collect(),
            TableError::TypeMismatch { column, .. }
            | TableError::RaggedColumn { column, .. }
            | TableError::EmptySelection { column, .. } => vec![column.as_str()],
            TableError::EmptyColumn(c)
            | TableError::UnknownColumn(c)
            | TableError::OverlappingColumns(c)
            | TableError::DuplicateColumn(c) => vec![c.as_str()],
            TableError::EmptySchema(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_names_in_order() {
        let err = TableError::MissingColumns(vec!["Handler".into(), "Date".into()]);
        assert_eq!(err.to_string(), "missing columns: Handler, Date");
        assert_eq!(err.columns(), vec!["Handler", "Date"]);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let err = TableError::EmptyColumn("Status".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "empty_column");
    }
}
