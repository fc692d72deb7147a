// src/schema/types.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// How column names in a file are compared against the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    /// Byte-for-byte, case-sensitive.
    #[default]
    Exact,
    /// Trimmed, inner whitespace collapsed, lower-cased.
    TrimLowercase,
}

impl NameMatching {
    pub fn normalize(self, name: &str) -> String {
        match self {
            NameMatching::Exact => name.to_string(),
            NameMatching::TrimLowercase => WHITESPACE_RUN
                .replace_all(name.trim(), " ")
                .to_lowercase(),
        }
    }
}

/// Ordered list of required columns for one dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub matching: NameMatching,
}

impl Schema {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
        matching: NameMatching,
    ) -> Result<Self> {
        let schema = Schema {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            matching,
        };
        schema.check()?;
        Ok(schema)
    }

    /// Re-checks invariants on a schema built through serde.
    pub fn check(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(TableError::EmptySchema(self.name.clone()));
        }
        let mut seen = std::collections::HashSet::new();
        for col in &self.columns {
            if !seen.insert(self.matching.normalize(col)) {
                return Err(TableError::DuplicateColumn(col.clone()));
            }
        }
        Ok(())
    }
}
