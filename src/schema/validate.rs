use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::types::Schema;
use crate::error::{Result, TableError};
use crate::table::RawTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    Invalid { missing: Vec<String> },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn missing(&self) -> &[String] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid { missing } => missing,
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid { missing } => Err(TableError::MissingColumns(missing)),
        }
    }
}

/// Every schema column absent from `table`, in schema order.
pub fn validate(table: &RawTable, schema: &Schema) -> ValidationResult {
    let present: HashSet<String> = table
        .column_names()
        .into_iter()
        .map(|n| schema.matching.normalize(n))
        .collect();

    let missing: Vec<String> = schema
        .columns
        .iter()
        .filter(|c| !present.contains(&schema.matching.normalize(c)))
        .cloned()
        .collect();

    if missing.is_empty() {
        debug!(schema = %schema.name, "table matches schema");
        ValidationResult::Valid
    } else {
        warn!(schema = %schema.name, ?missing, "table is missing columns");
        ValidationResult::Invalid { missing }
    }
}

/// Validate, then rename every matched column to the schema's spelling.
/// Columns the schema does not name are kept as they are.
pub fn conform(table: &RawTable, schema: &Schema) -> Result<RawTable> {
    validate(table, schema).into_result()?;

    let canonical: HashMap<String, &String> = schema
        .columns
        .iter()
        .map(|c| (schema.matching.normalize(c), c))
        .collect();

    let mut claimed: HashSet<&str> = HashSet::new();
    for name in table.column_names() {
        if let Some(target) = canonical.get(&schema.matching.normalize(name)) {
            if !claimed.insert(target.as_str()) {
                return Err(TableError::DuplicateColumn(target.to_string()));
            }
        }
    }

    table.rename_columns(|name| {
        canonical
            .get(&schema.matching.normalize(name))
            .map(|c| c.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NameMatching;
    use crate::table::Cell;

    fn table(names: &[&str]) -> RawTable {
        RawTable::new(names.iter().map(|n| (*n, vec![Cell::Empty])).collect()).unwrap()
    }

    #[test]
    fn reports_only_the_missing_column() {
        let schema = Schema::new(
            "status",
            ["Propeller ID", "Handler", "Status"],
            NameMatching::Exact,
        )
        .unwrap();
        let result = validate(&table(&["Status", "Propeller ID", "Extra"]), &schema);
        assert_eq!(
            result,
            ValidationResult::Invalid {
                missing: vec!["Handler".into()]
            }
        );
        assert_eq!(
            result.into_result().unwrap_err(),
            TableError::MissingColumns(vec!["Handler".into()])
        );
    }

    #[test]
    fn missing_columns_come_back_in_schema_order() {
        let schema = Schema::new("s", ["C", "A", "B"], NameMatching::Exact).unwrap();
        let result = validate(&table(&["X"]), &schema);
        assert_eq!(result.missing(), ["C", "A", "B"]);
    }

    #[test]
    fn exact_policy_is_case_sensitive() {
        let schema = Schema::new("s", ["Status"], NameMatching::Exact).unwrap();
        assert!(!validate(&table(&["status"]), &schema).is_valid());
        assert!(validate(&table(&["Status"]), &schema).is_valid());
    }

    #[test]
    fn conform_renames_to_schema_spelling() {
        let schema = Schema::new(
            "s",
            ["Propeller ID", "Status"],
            NameMatching::TrimLowercase,
        )
        .unwrap();
        let raw = table(&[" propeller  id", "STATUS ", "Notes"]);
        assert!(validate(&raw, &schema).is_valid());

        let conformed = conform(&raw, &schema).unwrap();
        assert_eq!(
            conformed.column_names(),
            vec!["Propeller ID", "Status", "Notes"]
        );
    }

    #[test]
    fn conform_rejects_two_columns_for_one_name() {
        let schema = Schema::new("s", ["Status"], NameMatching::TrimLowercase).unwrap();
        let err = conform(&table(&["Status", "status "]), &schema).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("Status".into()));
    }

    #[test]
    fn conform_fails_on_missing() {
        let schema = Schema::new("s", ["Status", "Handler"], NameMatching::Exact).unwrap();
        let err = conform(&table(&["Status"]), &schema).unwrap_err();
        assert_eq!(err, TableError::MissingColumns(vec!["Handler".into()]));
    }
}
