//! Spreadsheet export of catalog snapshots.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::HubtrailError;

use super::CatalogTable;

/// File name of the model snapshot export.
pub const MODELS_EXPORT: &str = "hugging_face_models_info.csv";
/// File name of the dataset snapshot export.
pub const DATASETS_EXPORT: &str = "hugging_face_datasets_info.csv";

/// Write `table` as CSV to `path` (header row first, no index column).
pub fn write_catalog_csv(path: &Path, table: &CatalogTable) -> Result<(), HubtrailError> {
    let file = File::create(path).map_err(HubtrailError::Io)?;
    let writer = BufWriter::new(file);

    let mut csv_writer = csv::Writer::from_writer(writer);
    write_rows(&mut csv_writer, table).map_err(|source| HubtrailError::CsvWrite {
        path: path.to_path_buf(),
        source,
    })?;

    csv_writer
        .into_inner()
        .map_err(|e| HubtrailError::Io(e.into_error()))?
        .flush()
        .map_err(HubtrailError::Io)?;

    Ok(())
}

/// Render `table` as a CSV string.
pub fn to_catalog_csv_string(table: &CatalogTable) -> Result<String, HubtrailError> {
    let mut csv_writer = csv::Writer::from_writer(Vec::new());
    write_rows(&mut csv_writer, table).map_err(|source| HubtrailError::CsvWrite {
        path: PathBuf::from("<memory>"),
        source,
    })?;

    let bytes = csv_writer
        .into_inner()
        .map_err(|e| HubtrailError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_rows<W: Write>(writer: &mut csv::Writer<W>, table: &CatalogTable) -> csv::Result<()> {
    if table.columns().is_empty() {
        return Ok(());
    }
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    Ok(())
}
