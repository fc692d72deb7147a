// src/table/mod.rs
pub mod cell;

pub use cell::{clean_str, Cell, ColumnType};

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Result, TableError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub cells: Vec<Cell>,
}

/// In-memory table as loaded from one uploaded file.
///
/// Columns keep the order the file declared them in. Every column holds the
/// same number of cells and names are unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTable {
    columns: Vec<Column>,
    rows: usize,
}

impl RawTable {
    /// Build from already-typed columns.
    pub fn new<S: Into<String>>(columns: Vec<(S, Vec<Cell>)>) -> Result<Self> {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, cells)| Column {
                name: name.into(),
                ty: ColumnType::of(&cells),
                cells,
            })
            .collect();
        Self::from_columns(columns)
    }

    /// Build from a header row plus text rows, inferring one type per column.
    ///
    /// Short rows are padded with empty cells (spreadsheets drop trailing
    /// blanks); a row longer than the header is rejected. Columns whose cells
    /// disagree on type keep every value as text. Blank header cells become
    /// `Unnamed: <index>`.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let headers: Vec<String> = headers
            .into_iter()
            .enumerate()
            .map(|(idx, h)| {
                if h.trim().is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    h
                }
            })
            .collect();
        let width = headers.len();
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() > width) {
            return Err(TableError::RaggedColumn {
                column: format!("row {}", idx),
                expected: width,
                found: row.len(),
            });
        }

        let mut parsed: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); width];
        let mut raw: Vec<Vec<&str>> = vec![Vec::with_capacity(rows.len()); width];
        for row in &rows {
            for idx in 0..width {
                let v = row.get(idx).map(String::as_str).unwrap_or("");
                parsed[idx].push(Cell::parse(v));
                raw[idx].push(v);
            }
        }

        let mut columns = Vec::with_capacity(width);
        for ((name, cells), raw_cells) in headers.into_iter().zip(parsed).zip(raw) {
            let ty = ColumnType::of(&cells);
            let cells = if ty == ColumnType::Text {
                // conflicting kinds: keep what the file said
                raw_cells
                    .into_iter()
                    .map(|v| match clean_str(v) {
                        s if s.is_empty() => Cell::Empty,
                        s => Cell::Text(s),
                    })
                    .collect()
            } else {
                cells
            };
            debug!(column = %name, ?ty, "derived column type");
            columns.push(Column { name, ty, cells });
        }

        let table = Self::from_columns(columns)?;
        // header-only files still know their row count
        Ok(RawTable {
            rows: rows.len(),
            ..table
        })
    }

    fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
        }

        let rows = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.cells.len() != rows) {
            return Err(TableError::RaggedColumn {
                column: bad.name.clone(),
                expected: rows,
                found: bad.cells.len(),
            });
        }

        Ok(RawTable { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`RawTable::column`] but reports a missing name as `UnknownColumn`.
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        self.column(name).and_then(|c| c.cells.get(row))
    }

    /// Distinct non-empty values of a column in first-appearance order.
    pub fn unique_values(&self, name: &str) -> Result<Vec<Cell>> {
        let col = self.require(name)?;
        let mut seen = HashSet::new();
        Ok(col
            .cells
            .iter()
            .filter(|c| !c.is_empty())
            .filter(|c| seen.insert(c.to_string()))
            .cloned()
            .collect())
    }

    /// Rows whose `name` cell equals `value`, as a new table with the same columns.
    pub fn filter_eq(&self, name: &str, value: &Cell) -> Result<RawTable> {
        let col = self.require(name)?;
        let keep: Vec<usize> = col
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| *c == value)
            .map(|(i, _)| i)
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                ty: c.ty,
                cells: keep.iter().map(|&i| c.cells[i].clone()).collect(),
            })
            .collect();
        Ok(RawTable {
            columns,
            rows: keep.len(),
        })
    }

    /// Same table with columns renamed through `rename`. Names `rename`
    /// returns `None` for are kept.
    pub fn rename_columns<F>(&self, mut rename: F) -> Result<RawTable>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: rename(&c.name).unwrap_or_else(|| c.name.clone()),
                ty: c.ty,
                cells: c.cells.clone(),
            })
            .collect();
        let renamed = Self::from_columns(columns)?;
        Ok(RawTable {
            rows: self.rows,
            ..renamed
        })
    }
}
