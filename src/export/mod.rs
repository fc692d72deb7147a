// src/export/mod.rs
//! Writers that hand melted records to a presentation layer.

pub mod columnar;

pub use columnar::{to_record_batch, write_parquet};

use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::{info, instrument};

use crate::process::LongRecord;

/// Identifier column names shared by every record of one melt.
pub(crate) fn identifier_columns(records: &[LongRecord]) -> Vec<String> {
    records
        .first()
        .map(|r| r.identifiers.iter().map(|(name, _)| name.clone()).collect())
        .unwrap_or_default()
}

/// Header: `row`, identifier columns, `stage`, `value`.
pub fn write_csv<W: Write>(records: &[LongRecord], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    let ids = identifier_columns(records);

    let mut header = vec!["row".to_string()];
    header.extend(ids.iter().cloned());
    header.push("stage".into());
    header.push("value".into());
    wtr.write_record(&header).context("writing CSV header")?;

    for rec in records {
        let mut fields = Vec::with_capacity(header.len());
        fields.push(rec.row.to_string());
        fields.extend(rec.identifiers.iter().map(|(_, c)| c.to_string()));
        fields.push(rec.stage.clone());
        fields.push(rec.value.to_string());
        wtr.write_record(&fields)
            .with_context(|| format!("writing CSV record for row {}", rec.row))?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[LongRecord], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records).context("writing JSON records")
}

/// Pick a writer from the file extension: `csv`, `json` or `parquet`.
#[instrument(level = "info", skip(records, path), fields(path = %path.as_ref().display()))]
pub fn export<P: AsRef<Path>>(records: &[LongRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "parquet" => write_parquet(records, path)?,
        "csv" | "json" => {
            let file = File::create(path)
                .with_context(|| format!("could not create `{}`", path.display()))?;
            let out = BufWriter::new(file);
            if ext == "csv" {
                write_csv(records, out)?;
            } else {
                write_json(records, out)?;
            }
        }
        other => return Err(anyhow!("no exporter for `.{}` files", other)),
    }
    info!(records = records.len(), "exported long records");
    Ok(())
}
