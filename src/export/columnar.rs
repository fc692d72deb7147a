use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, StringArray, UInt64Array},
    datatypes::{DataType, Field, Schema as ArrowSchema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    sync::Arc,
};
use tracing::{debug, instrument};

use super::identifier_columns;
use crate::process::LongRecord;
use crate::table::Cell;

/// Arrow layout of melted records: `row`, one Utf8 column per identifier,
/// `stage`, `value` (numeric cells only) and `value_text` (every cell).
pub fn to_record_batch(records: &[LongRecord]) -> Result<RecordBatch> {
    let ids = identifier_columns(records);

    let mut fields = vec![Field::new("row", DataType::UInt64, false)];
    fields.extend(ids.iter().map(|name| Field::new(name, DataType::Utf8, true)));
    fields.push(Field::new("stage", DataType::Utf8, false));
    fields.push(Field::new("value", DataType::Float64, true));
    fields.push(Field::new("value_text", DataType::Utf8, true));
    let schema = Arc::new(ArrowSchema::new(fields));

    let mut cols: Vec<ArrayRef> = Vec::with_capacity(ids.len() + 4);
    cols.push(Arc::new(UInt64Array::from_iter_values(
        records.iter().map(|r| r.row as u64),
    )));
    for idx in 0..ids.len() {
        let arr: StringArray = records
            .iter()
            .map(|r| r.identifiers.get(idx).map(|(_, c)| c).and_then(text_of))
            .collect();
        cols.push(Arc::new(arr));
    }
    cols.push(Arc::new(StringArray::from_iter_values(
        records.iter().map(|r| r.stage.as_str()),
    )));
    cols.push(Arc::new(
        records
            .iter()
            .map(|r| match &r.value {
                Cell::Number(_) | Cell::Decimal(_) => r.value.as_f64(),
                _ => None,
            })
            .collect::<Float64Array>(),
    ));
    cols.push(Arc::new(
        records
            .iter()
            .map(|r| text_of(&r.value))
            .collect::<StringArray>(),
    ));

    RecordBatch::try_new(schema, cols).context("building record batch")
}

fn text_of(cell: &Cell) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Snappy-compressed Parquet, written to `<path>.tmp` then renamed.
#[instrument(level = "info", skip(records, path), fields(path = %path.as_ref().display()))]
pub fn write_parquet<P: AsRef<Path>>(records: &[LongRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let batch = to_record_batch(records)?;
    let tmp = path.with_extension("parquet.tmp");

    let file = File::create(&tmp)
        .with_context(|| format!("creating temporary Parquet file `{}`", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
        .context("initializing Parquet writer")?;
    writer.write(&batch).context("writing batch to Parquet")?;
    writer.close().context("closing Parquet writer")?;

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming `{}` into place", tmp.display()))?;
    debug!(rows = batch.num_rows(), "wrote parquet");
    Ok(())
}
