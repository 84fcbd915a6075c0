// src/clean/age.rs
use crate::clean::AGE_COLUMN;
use crate::error::{ParseError, Result};
use crate::table::{column_index, has_column, replace_column, string_column};
use arrow::{
    array::{Array, ArrayRef, Int64Builder},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::debug;

const STAGE: &str = "age derivation";

/// Parse a year-of-birth cell. Fractions are floored; anything non-numeric or outside
/// the `i32` range is an error.
pub fn parse_birth_year(row: usize, raw: &str) -> Result<i64, ParseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .map(f64::floor)
        .filter(|y| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(y))
        .map(|y| y as i64)
        .ok_or_else(|| ParseError::BirthYear {
            row,
            value: raw.to_string(),
        })
}

/// Replace the birth-year column with an `Int64` age column named [`AGE_COLUMN`].
///
/// Rows whose birth year is missing or unparseable get a missing age. Returns the new
/// batch and the number of unparseable (non-empty) cells. If the birth-year column is
/// gone but the age column exists, the batch was already converted and comes back as is.
pub fn derive_age(
    batch: &RecordBatch,
    birth_year: &str,
    reference_year: i32,
) -> Result<(RecordBatch, usize)> {
    if !has_column(batch, birth_year) && has_column(batch, AGE_COLUMN) {
        debug!("age already derived");
        return Ok((batch.clone(), 0));
    }
    let idx = column_index(batch, birth_year, STAGE)?;
    let years = string_column(batch, idx)?;

    let mut unparsed = 0usize;
    let mut b = Int64Builder::with_capacity(years.len());
    for (row, cell) in years.iter().enumerate() {
        let age = match cell.map(|raw| parse_birth_year(row, raw)) {
            Some(Ok(year)) => Some(i64::from(reference_year) - year),
            Some(Err(e)) => {
                debug!(%e, "age left missing");
                unparsed += 1;
                None
            }
            None => None,
        };
        b.append_option(age);
    }

    let batch = replace_column(batch, idx, Some(AGE_COLUMN), Arc::new(b.finish()) as ArrayRef)?;
    Ok((batch, unparsed))
}
