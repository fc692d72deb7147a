//! Data core for spreadsheet dashboards: check an uploaded table against the
//! columns a dashboard expects, melt its per-stage columns into long records,
//! and compute the small insights shown next to the charts.
//!
//! Everything here is a pure function of the [`RawTable`] passed in. Loading
//! ([`load`]) and writing results ([`export`]) sit around that core.

pub mod dashboard;
pub mod decimal;
pub mod error;
pub mod export;
pub mod load;
pub mod process;
pub mod schema;
pub mod table;

pub use dashboard::{Dashboard, DashboardReport, Registry};
pub use decimal::Fixed2;
pub use error::TableError;
pub use process::{melt, melt_numeric, summarize, Insight, LongRecord};
pub use schema::{conform, validate, NameMatching, Schema, ValidationResult};
pub use table::{Cell, ColumnType, RawTable};
