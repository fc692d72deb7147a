// src/load/mod.rs
//! Turns uploaded files into a [`RawTable`].

#[cfg(feature = "xlsx")]
pub mod xlsx;

use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, info, instrument};

use crate::table::RawTable;

/// Load by extension: `csv`/`txt` always, `xlsx`/`xls` with the `xlsx` feature.
pub fn load<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xls" | "xlsm" => xlsx::load_xlsx(path),
        #[cfg(not(feature = "xlsx"))]
        "xlsx" | "xls" | "xlsm" => bail!(
            "{} is a workbook; rebuild with the `xlsx` feature to read it",
            path.display()
        ),
        other => Err(anyhow!(
            "unsupported file type `{}` for {}",
            other,
            path.display()
        )),
    }
}

#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path.as_ref()))?;
    let table = read_csv(file)?;
    info!(
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded csv"
    );
    Ok(table)
}

/// First record is the header. Every data record must have the header's width.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // widths are checked below with a better message
        .from_reader(reader);

    let mut records = rdr.records();
    let headers: Vec<String> = match records.next() {
        Some(first) => first
            .context("CSV parse error in header")?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                // spreadsheets exported on Windows lead with a BOM
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect(),
        None => bail!("CSV input is empty"),
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx + 1))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if record.len() != headers.len() {
            bail!(
                "record {} has {} fields, header has {}",
                idx + 1,
                record.len(),
                headers.len()
            );
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(headers = ?headers, rows = rows.len(), "parsed csv");

    RawTable::from_rows(headers, rows).context("building table from CSV")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, ColumnType};
    use std::io::Write;
    use tempfile::Builder;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,sheetlens::load=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn load_status_csv() -> Result<()> {
        init_test_logging();
        let content = "\u{feff}Status,Overall Efficiency,Standard Overall Efficiency\n\
                       Done,90,87.33\n\
                       \"Pending\",85.5,87.33\n\
                       ,,\n\
                       Done,,87.33\n";
        let mut tmp = Builder::new().suffix(".csv").tempfile()?;
        tmp.write_all(content.as_bytes())?;

        let table = load(tmp.path())?;
        assert_eq!(
            table.column_names(),
            vec!["Status", "Overall Efficiency", "Standard Overall Efficiency"]
        );
        // the blank line is skipped
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(1, "Status"), Some(&Cell::text("Pending")));
        assert_eq!(table.cell(2, "Overall Efficiency"), Some(&Cell::Empty));
        assert_eq!(
            table.column("Overall Efficiency").map(|c| c.ty),
            Some(ColumnType::Number)
        );
        Ok(())
    }

    #[test]
    fn header_only_csv_has_zero_rows() -> Result<()> {
        let table = read_csv("Propeller ID,Handler\n".as_bytes())?;
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_names(), vec!["Propeller ID", "Handler"]);
        Ok(())
    }

    #[test]
    fn trailing_unnamed_columns_still_validate() -> Result<()> {
        let table = read_csv(
            "Status,Overall Efficiency,Standard Overall Efficiency,,\nDone,90,85,,\n".as_bytes(),
        )?;
        assert_eq!(table.column_count(), 5);
        assert!(table.has_column("Unnamed: 3"));
        assert!(table.has_column("Unnamed: 4"));

        let schema = crate::Schema::new(
            "efficiency",
            vec!["Status", "Overall Efficiency", "Standard Overall Efficiency"],
            crate::NameMatching::Exact,
        )?;
        assert!(crate::validate(&table, &schema).is_valid());
        Ok(())
    }

    #[test]
    fn ragged_record_is_rejected() {
        let err = read_csv("A,B\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("record 2 has 1 fields"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(read_csv("".as_bytes()).is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() -> Result<()> {
        let tmp = Builder::new().suffix(".pdf").tempfile()?;
        let err = load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported file type `pdf`"));
        Ok(())
    }
}
