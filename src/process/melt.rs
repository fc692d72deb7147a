// src/process/melt.rs
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::decimal::Fixed2;
use crate::error::{Result, TableError};
use crate::table::{Cell, Column, ColumnType, RawTable};

/// One `(entity, stage, value)` row of a melted table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    /// Row index in the source table.
    pub row: usize,
    #[serde(serialize_with = "as_ordered_map")]
    pub identifiers: Vec<(String, Cell)>,
    pub stage: String,
    pub value: Cell,
}

impl LongRecord {
    pub fn identifier(&self, column: &str) -> Option<&Cell> {
        self.identifiers
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }
}

fn as_ordered_map<S: Serializer>(
    ids: &[(String, Cell)],
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_map(ids.iter().map(|(k, v)| (k, v)))
}

/// Wide → long. Value columns typed `Number` are rounded to two decimals,
/// everything else passes through unchanged.
///
/// Output is row-major, then in `value_columns` order.
pub fn melt(
    table: &RawTable,
    id_columns: &[impl AsRef<str>],
    value_columns: &[impl AsRef<str>],
) -> Result<Vec<LongRecord>> {
    let (ids, values) = resolve(table, id_columns, value_columns)?;
    let coerce: Vec<bool> = values.iter().map(|c| c.ty == ColumnType::Number).collect();
    emit(table.row_count(), &ids, &values, &coerce)
}

/// Like [`melt`], but every column in `numeric` must hold numbers: numeric
/// text is accepted, empty cells stay empty, anything else is a
/// `TypeMismatch`.
pub fn melt_numeric(
    table: &RawTable,
    id_columns: &[impl AsRef<str>],
    value_columns: &[impl AsRef<str>],
    numeric: &[impl AsRef<str>],
) -> Result<Vec<LongRecord>> {
    let (ids, values) = resolve(table, id_columns, value_columns)?;
    let strict: HashSet<&str> = numeric.iter().map(|c| c.as_ref()).collect();
    for name in &strict {
        if !values.iter().any(|c| c.name == *name) {
            return Err(TableError::UnknownColumn(name.to_string()));
        }
    }
    let coerce: Vec<bool> = values
        .iter()
        .map(|c| c.ty == ColumnType::Number || strict.contains(c.name.as_str()))
        .collect();
    emit(table.row_count(), &ids, &values, &coerce)
}

/// Look up both column lists, rejecting unknown names and overlap.
fn resolve<'t>(
    table: &'t RawTable,
    id_columns: &[impl AsRef<str>],
    value_columns: &[impl AsRef<str>],
) -> Result<(Vec<&'t Column>, Vec<&'t Column>)> {
    let id_names: HashSet<&str> = id_columns.iter().map(|c| c.as_ref()).collect();
    if let Some(dup) = value_columns
        .iter()
        .map(|c| c.as_ref())
        .find(|v| id_names.contains(v))
    {
        return Err(TableError::OverlappingColumns(dup.to_string()));
    }

    let ids = id_columns
        .iter()
        .map(|c| table.require(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let values = value_columns
        .iter()
        .map(|c| table.require(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok((ids, values))
}

#[instrument(level = "debug", skip_all, fields(rows = rows, stages = values.len()))]
fn emit(
    rows: usize,
    ids: &[&Column],
    values: &[&Column],
    coerce: &[bool],
) -> Result<Vec<LongRecord>> {
    let mut out = Vec::with_capacity(rows * values.len());
    for row in 0..rows {
        let identifiers: Vec<(String, Cell)> = ids
            .iter()
            .map(|c| (c.name.clone(), c.cells[row].clone()))
            .collect();

        for (col, &numeric) in values.iter().zip(coerce) {
            let cell = &col.cells[row];
            let value = if numeric {
                to_decimal(&col.name, row, cell)?
            } else {
                cell.clone()
            };
            out.push(LongRecord {
                row,
                identifiers: identifiers.clone(),
                stage: col.name.clone(),
                value,
            });
        }
    }
    debug!(records = out.len(), "melted table");
    Ok(out)
}

fn to_decimal(column: &str, row: usize, cell: &Cell) -> Result<Cell> {
    if cell.is_empty() {
        return Ok(Cell::Empty);
    }
    if matches!(cell, Cell::Decimal(_)) {
        return Ok(cell.clone());
    }
    let parsed = match cell {
        Cell::Date(_) => None,
        other => other.as_f64().and_then(Fixed2::from_f64),
    };
    parsed.map(Cell::Decimal).ok_or_else(|| TableError::TypeMismatch {
        column: column.to_string(),
        row,
        value: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn propellers() -> RawTable {
        RawTable::new(vec![
            ("Propeller ID", vec!["P1".into(), "P2".into()]),
            ("Handler", vec!["Ana".into(), "Bo".into()]),
            ("Polishing", vec![1.234.into(), 2.0.into()]),
            ("Packaging", vec![Cell::Empty, 4.5.into()]),
        ])
        .unwrap()
    }

    #[test]
    fn single_propeller_gives_one_record_per_stage() {
        let table = RawTable::new(vec![
            ("PropellerID", vec![Cell::text("P1")]),
            ("Polishing", vec![Cell::Number(3.0)]),
            ("Packaging", vec![Cell::Number(5.0)]),
        ])
        .unwrap();

        let out = melt(&table, &["PropellerID"], &["Polishing", "Packaging"]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|r| r.identifier("PropellerID") == Some(&Cell::text("P1"))));
        assert_eq!(out[0].stage, "Polishing");
        assert_eq!(out[1].stage, "Packaging");
    }

    #[test]
    fn output_is_row_major_and_rounded() {
        let out = melt(&propellers(), &["Propeller ID"], &["Polishing", "Packaging"]).unwrap();
        let flat: Vec<(usize, &str, String)> = out
            .iter()
            .map(|r| (r.row, r.stage.as_str(), r.value.to_string()))
            .collect();
        assert_eq!(
            flat,
            vec![
                (0, "Polishing", "1.23".to_string()),
                (0, "Packaging", "".to_string()),
                (1, "Polishing", "2.00".to_string()),
                (1, "Packaging", "4.50".to_string()),
            ]
        );
    }

    #[test]
    fn text_value_columns_pass_through() {
        let out = melt(&propellers(), &["Propeller ID"], &["Handler"]).unwrap();
        assert_eq!(out[1].value, Cell::text("Bo"));
    }

    #[test]
    fn overlap_and_unknown_columns_are_rejected() {
        let t = propellers();
        assert_eq!(
            melt(&t, &["Propeller ID"], &["Propeller ID"]).unwrap_err(),
            TableError::OverlappingColumns("Propeller ID".into())
        );
        assert_eq!(
            melt(&t, &["Propeller ID"], &["Shipping"]).unwrap_err(),
            TableError::UnknownColumn("Shipping".into())
        );
    }

    #[test]
    fn strict_numeric_reports_the_offending_cell() {
        let table = RawTable::from_rows(
            vec!["Propeller ID".into(), "Time".into()],
            vec![
                vec!["P1".into(), "1.5".into()],
                vec!["P2".into(), "late".into()],
            ],
        )
        .unwrap();

        let err = melt_numeric(&table, &["Propeller ID"], &["Time"], &["Time"]).unwrap_err();
        assert_eq!(
            err,
            TableError::TypeMismatch {
                column: "Time".into(),
                row: 1,
                value: "late".into()
            }
        );

        // the lenient form leaves the mixed column alone
        let out = melt(&table, &["Propeller ID"], &["Time"]).unwrap();
        assert_eq!(out[1].value, Cell::text("late"));
    }

    #[test]
    fn strict_numeric_coerces_numeric_text() {
        let table = RawTable::new(vec![
            ("Propeller ID", vec![Cell::text("P1")]),
            ("Time", vec![Cell::text("12.345")]),
        ])
        .unwrap();
        let out = melt_numeric(&table, &["Propeller ID"], &["Time"], &["Time"]).unwrap();
        assert_eq!(out[0].value.to_string(), "12.35");
    }

    #[test]
    fn zero_rows_gives_no_records() {
        let table = RawTable::from_rows(vec!["Id".into(), "Stage".into()], vec![]).unwrap();
        assert!(melt(&table, &["Id"], &["Stage"]).unwrap().is_empty());
    }

    #[test]
    fn serializes_identifiers_as_object() {
        let out = melt(&propellers(), &["Propeller ID"], &["Polishing"]).unwrap();
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["identifiers"]["Propeller ID"], "P1");
        assert_eq!(json["value"], 1.23);
    }
}
