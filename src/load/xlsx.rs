use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::table::RawTable;

/// Load the first worksheet; its first row is the header.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_xlsx<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(&path)
        .with_context(|| format!("Failed to open workbook: {:?}", path.as_ref()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("No sheets found in {:?}", path.as_ref()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read worksheet `{}`", sheet_name))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| anyhow!("worksheet `{}` is empty", sheet_name))?
        .iter()
        .map(cell_text)
        .collect();

    let body: Vec<Vec<String>> = rows
        .filter(|r| r.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|r| r.iter().map(cell_text).collect())
        .collect();

    info!(sheet = %sheet_name, rows = body.len(), columns = headers.len(), "loaded worksheet");
    RawTable::from_rows(headers, body).context("building table from worksheet")
}

/// Render a workbook cell the way a CSV export would, so both loaders share
/// one inference path.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            warn!(error = ?e, "cell holds a spreadsheet error");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, ColumnType};
    use calamine::CellErrorType;
    use rust_xlsxwriter::{Format, Workbook};
    use tempfile::tempdir;

    #[test]
    fn cell_text_matches_csv_rendering() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Int(12)), "12");
        assert_eq!(cell_text(&Data::Float(8.125)), "8.125");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
        assert_eq!(cell_text(&Data::String("Done".into())), "Done");
        assert_eq!(cell_text(&Data::Error(CellErrorType::Div0)), "");
    }

    #[test]
    fn first_sheet_loads_with_typed_columns() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("upload.xlsx");

        let mut workbook = Workbook::new();
        let date = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        for (col, name) in ["Propeller ID", "Quality", "Shipped", "Date"].iter().enumerate() {
            sheet.write_string(0, col as u16, *name)?;
        }
        sheet.write_string(1, 0, "P1")?;
        sheet.write_number(1, 1, 9.5)?;
        sheet.write_boolean(1, 2, true)?;
        sheet.write_number_with_format(1, 3, 45352.0, &date)?; // 2024-03-01
        // row 2 left blank
        sheet.write_string(3, 0, "P2")?;
        sheet.write_number(3, 1, 7.0)?;
        sheet.write_boolean(3, 2, false)?;
        sheet.write_number_with_format(3, 3, 45353.0, &date)?;
        workbook.save(&path)?;

        let table = crate::load::load(&path)?;
        assert_eq!(
            table.column_names(),
            vec!["Propeller ID", "Quality", "Shipped", "Date"]
        );
        assert_eq!(table.row_count(), 2);

        assert_eq!(table.cell(0, "Propeller ID"), Some(&Cell::text("P1")));
        assert_eq!(table.cell(1, "Quality"), Some(&Cell::Number(7.0)));
        assert_eq!(
            table.column("Quality").map(|c| c.ty),
            Some(ColumnType::Number)
        );
        assert_eq!(table.cell(0, "Shipped"), Some(&Cell::text("true")));
        assert_eq!(
            table.column("Date").map(|c| c.ty),
            Some(ColumnType::Date)
        );
        assert_eq!(
            table.cell(0, "Date").map(ToString::to_string),
            Some("2024-03-01".to_string())
        );
        Ok(())
    }
}
