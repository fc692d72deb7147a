// src/process/insight.rs
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::decimal::Fixed2;
use crate::error::{Result, TableError};
use crate::table::{Cell, RawTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Cell,
    pub count: usize,
}

/// Most frequent value of a categorical column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mode {
    pub column: String,
    pub value: Cell,
    pub count: usize,
}

/// Where mean A sits relative to mean B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    Below,
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanComparison {
    pub column_a: String,
    pub column_b: String,
    pub mean_a: Fixed2,
    pub mean_b: Fixed2,
    pub comparison: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub most_frequent: Mode,
    pub means: MeanComparison,
}

/// Non-empty values with their counts, most frequent first. Equal counts
/// keep first-appearance order.
pub fn value_counts(table: &RawTable, column: &str) -> Result<Vec<ValueCount>> {
    let col = table.require(column)?;
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();

    for cell in col.cells.iter().filter(|c| !c.is_empty()) {
        match index.get(&cell.to_string()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(cell.to_string(), counts.len());
                counts.push(ValueCount {
                    value: cell.clone(),
                    count: 1,
                });
            }
        }
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(counts)
}

pub fn most_frequent(table: &RawTable, column: &str) -> Result<Mode> {
    let top = value_counts(table, column)?
        .into_iter()
        .next()
        .ok_or_else(|| TableError::EmptyColumn(column.to_string()))?;
    Ok(Mode {
        column: column.to_string(),
        value: top.value,
        count: top.count,
    })
}

/// Mean over the numeric cells of `column`, rounded to two decimals.
/// Empty and non-numeric cells are skipped, not counted as zero.
pub fn mean(table: &RawTable, column: &str) -> Result<Fixed2> {
    let col = table.require(column)?;
    let (sum, n, last_row) = col
        .cells
        .iter()
        .enumerate()
        .filter_map(|(row, cell)| cell.as_f64().map(|v| (row, v)))
        .fold((0.0_f64, 0_usize, 0_usize), |(s, n, _), (row, v)| {
            (s + v, n + 1, row)
        });

    if n == 0 {
        return Err(TableError::EmptyColumn(column.to_string()));
    }
    let avg = sum / n as f64;
    // reported against the last row that fed the sum
    Fixed2::from_f64(avg).ok_or_else(|| TableError::TypeMismatch {
        column: column.to_string(),
        row: last_row,
        value: avg.to_string(),
    })
}

/// Compares rounded means, so `87.331` and `87.334` are `Equal`.
pub fn compare_means(table: &RawTable, column_a: &str, column_b: &str) -> Result<MeanComparison> {
    let mean_a = mean(table, column_a)?;
    let mean_b = mean(table, column_b)?;
    let comparison = match mean_a.cmp(&mean_b) {
        std::cmp::Ordering::Greater => Comparison::Above,
        std::cmp::Ordering::Less => Comparison::Below,
        std::cmp::Ordering::Equal => Comparison::Equal,
    };
    Ok(MeanComparison {
        column_a: column_a.to_string(),
        column_b: column_b.to_string(),
        mean_a,
        mean_b,
        comparison,
    })
}

pub fn summarize(
    table: &RawTable,
    categorical: &str,
    numeric_a: &str,
    numeric_b: &str,
) -> Result<Insight> {
    let most_frequent = most_frequent(table, categorical)?;
    let means = compare_means(table, numeric_a, numeric_b)?;
    debug!(
        mode = %most_frequent.value,
        count = most_frequent.count,
        mean_a = %means.mean_a,
        mean_b = %means.mean_b,
        "computed insight"
    );
    Ok(Insight {
        most_frequent,
        means,
    })
}
