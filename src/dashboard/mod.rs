// src/dashboard/mod.rs
//! A dashboard ties one schema to a melt layout and the insight it shows.

pub mod registry;
pub mod report;

pub use registry::Registry;
pub use report::{missing_columns_message, DashboardReport};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{Result, TableError};
use crate::process::{melt_numeric, summarize, value_counts};
use crate::schema::{conform, validate, Schema, ValidationResult};
use crate::table::{Cell, RawTable};

/// Columns feeding the text insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightColumns {
    pub categorical: String,
    pub numeric_a: String,
    pub numeric_b: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub name: String,
    pub title: String,
    pub schema: Schema,
    /// Entity columns; the first one drives the entity selector.
    #[serde(default)]
    pub identifiers: Vec<String>,
    /// Wide columns melted into `(stage, value)` pairs, in chart order.
    pub stages: Vec<String>,
    /// Stages that must hold numbers.
    #[serde(default)]
    pub numeric_stages: Vec<String>,
    /// Categorical column counted for the distribution chart.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub insight: Option<InsightColumns>,
}

impl Dashboard {
    pub fn validate(&self, table: &RawTable) -> ValidationResult {
        validate(table, &self.schema)
    }

    /// Entity column used by [`Dashboard::focus`].
    pub fn primary_identifier(&self) -> Option<&str> {
        self.identifiers.first().map(String::as_str)
    }

    /// Check, reshape and summarize one uploaded table.
    #[instrument(level = "info", skip_all, fields(dashboard = %self.name, rows = table.row_count()))]
    pub fn run(&self, table: &RawTable) -> Result<DashboardReport> {
        let table = conform(table, &self.schema)?;

        let records = melt_numeric(
            &table,
            &self.identifiers,
            &self.stages,
            &self.numeric_stages,
        )?;

        let entities = match self.primary_identifier() {
            Some(id) => table.unique_values(id)?,
            None => Vec::new(),
        };

        let category_counts = match &self.category {
            Some(col) => value_counts(&table, col)?,
            None => Vec::new(),
        };

        let insight = match &self.insight {
            Some(cols) => Some(summarize(
                &table,
                &cols.categorical,
                &cols.numeric_a,
                &cols.numeric_b,
            )?),
            None => None,
        };

        info!(
            records = records.len(),
            entities = entities.len(),
            "dashboard data ready"
        );
        Ok(DashboardReport {
            dashboard: self.name.clone(),
            title: self.title.clone(),
            rows: table.row_count(),
            entities,
            records,
            insight,
            category_counts,
        })
    }

    /// Rows of a single entity, with columns already renamed to the schema.
    pub fn focus(&self, table: &RawTable, entity: &Cell) -> Result<RawTable> {
        let column = self.primary_identifier().ok_or_else(|| {
            TableError::UnknownColumn(format!("{}: no identifier column", self.name))
        })?;
        let table = conform(table, &self.schema)?;
        let selected = table.filter_eq(column, entity)?;
        if selected.row_count() == 0 {
            return Err(TableError::EmptySelection {
                column: column.to_string(),
                value: entity.to_string(),
            });
        }
        Ok(selected)
    }

    /// [`Dashboard::focus`] followed by [`Dashboard::run`].
    pub fn run_for(&self, table: &RawTable, entity: &Cell) -> Result<DashboardReport> {
        self.run(&self.focus(table, entity)?)
    }
}
