// src/load/mod.rs
use crate::error::LoadError;
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use csv::ReaderBuilder;
use std::{fs::File, path::Path, sync::Arc};
use tracing::{debug, info};

pub mod postcode;

pub use postcode::{load_postcode_map, normalize_postcode, PostcodeMap};

/// Cell text that survey exports use for "no value", read as missing on load.
/// `-9999` is not among them; null normalization handles it after pruning.
pub const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_token(s: &str) -> bool {
    NA_TOKENS.contains(&s)
}

#[derive(Debug)]
pub struct RawTable {
    /// Column names, from the first record of the file.
    pub headers: Vec<String>,
    /// Every following record as a Vec of Strings (one per header).
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Read a comma-separated file with a header row. Ragged records are an error.
    #[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let csv_err = |source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(csv_err)?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        debug!(columns = headers.len(), rows = rows.len(), "read csv");
        Ok(Self { headers, rows })
    }

    /// Position of `column`, or a `MissingColumn` error tagged with `table`.
    pub fn column_position(&self, table: &str, column: &str) -> Result<usize, LoadError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| LoadError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// One nullable text column per header; empty cells and [`NA_TOKENS`] become null.
    pub fn into_batch(self) -> Result<RecordBatch, LoadError> {
        let n_rows = self.rows.len();
        let mut fields = Vec::with_capacity(self.headers.len());
        let mut cols: Vec<ArrayRef> = Vec::with_capacity(self.headers.len());

        for (i, name) in self.headers.iter().enumerate() {
            let arr: StringArray = self
                .rows
                .iter()
                .map(|row| row.get(i).map(String::as_str).filter(|s| !is_na_token(s)))
                .collect();
            fields.push(Field::new(name, DataType::Utf8, true));
            cols.push(Arc::new(arr) as ArrayRef);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(n_rows));
        Ok(RecordBatch::try_new_with_options(
            Arc::new(Schema::new(fields)),
            cols,
            &options,
        )?)
    }
}

/// Read the survey export into a table of nullable text columns.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_survey<P: AsRef<Path>>(path: P) -> Result<RecordBatch, LoadError> {
    let raw = RawTable::from_csv_path(path)?;
    let batch = raw.into_batch()?;
    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "loaded survey"
    );
    Ok(batch)
}
