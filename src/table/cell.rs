use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use std::fmt;

use crate::decimal::Fixed2;

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Decimal(Fixed2),
}

impl Cell {
    /// Parse a raw text cell: trims, strips outer quotes, then tries number,
    /// then date, then falls back to text.
    pub fn parse(raw: &str) -> Cell {
        let v = clean_str(raw);
        if v.is_empty() {
            return Cell::Empty;
        }
        if let Some(n) = parse_number(&v) {
            return Cell::Number(n);
        }
        if let Some(d) = parse_date(&v) {
            return Cell::Date(d);
        }
        Cell::Text(v)
    }

    pub fn text(s: impl Into<String>) -> Cell {
        Cell::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric view of the cell. Text is accepted when it parses as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Decimal(d) => Some(d.to_f64()),
            Cell::Text(s) => parse_number(s.trim()),
            Cell::Empty | Cell::Date(_) => None,
        }
    }

    pub fn kind(&self) -> ColumnType {
        match self {
            Cell::Empty => ColumnType::Empty,
            Cell::Text(_) => ColumnType::Text,
            Cell::Number(_) | Cell::Decimal(_) => ColumnType::Number,
            Cell::Date(_) => ColumnType::Date,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Date(d) if d.num_seconds_from_midnight() == 0 => {
                write!(f, "{}", d.format("%Y-%m-%d"))
            }
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Cell::Decimal(d) => write!(f, "{}", d),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Per-column value type, inferred from the non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Empty,
    Text,
    Number,
    Date,
}

impl ColumnType {
    /// First non-empty kind wins; any disagreement makes the column text.
    pub fn of(cells: &[Cell]) -> ColumnType {
        let mut seen = ColumnType::Empty;
        for cell in cells {
            let kind = cell.kind();
            match (seen, kind) {
                (_, ColumnType::Empty) => {}
                (ColumnType::Empty, k) => seen = k,
                (prev, k) if prev != k => return ColumnType::Text,
                _ => {}
            }
        }
        seen
    }
}

/// Trim whitespace and strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_number(v: &str) -> Option<f64> {
    v.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub(crate) fn parse_date(v: &str) -> Option<NaiveDateTime> {
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(v, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(v, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_infers_kind() {
        assert_eq!(Cell::parse("  "), Cell::Empty);
        assert_eq!(Cell::parse("\"42.5\""), Cell::Number(42.5));
        assert_eq!(Cell::parse(" Done "), Cell::text("Done"));
        assert_eq!(Cell::parse("NaN"), Cell::text("NaN"));
        assert!(matches!(Cell::parse("2024/12/22 00:05:00"), Cell::Date(_)));
        assert!(matches!(Cell::parse("2024-03-01"), Cell::Date(_)));
    }

    #[test]
    fn display_keeps_spreadsheet_look() {
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(3.25).to_string(), "3.25");
        assert_eq!(Cell::parse("2024-03-01").to_string(), "2024-03-01");
        assert_eq!(
            Cell::parse("2024/03/01 08:30:00").to_string(),
            "2024-03-01 08:30:00"
        );
    }

    #[test]
    fn column_type_falls_back_to_text_on_conflict() {
        let cells = vec![Cell::Empty, Cell::Number(1.0), Cell::Number(2.0)];
        assert_eq!(ColumnType::of(&cells), ColumnType::Number);

        let mixed = vec![Cell::Number(1.0), Cell::text("n/a")];
        assert_eq!(ColumnType::of(&mixed), ColumnType::Text);

        assert_eq!(ColumnType::of(&[Cell::Empty]), ColumnType::Empty);
    }

    #[test]
    fn text_numbers_have_numeric_view() {
        assert_eq!(Cell::text(" 7 ").as_f64(), Some(7.0));
        assert_eq!(Cell::text("seven").as_f64(), None);
        assert_eq!(Cell::Empty.as_f64(), None);
    }
}
