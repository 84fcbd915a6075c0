// src/clean/dedup.rs
use crate::clean::nulls::is_null_token;
use crate::error::Result;
use crate::table::{column_index, string_column, take_rows};
use arrow::{array::Array, record_batch::RecordBatch};
use std::collections::HashSet;
use tracing::debug;

const STAGE: &str = "deduplication";

/// Keep the first row for each respondent id. Missing ids and null tokens count as
/// one shared id.
/// Returns the new batch and how many rows were dropped.
pub fn dedup_respondents(batch: &RecordBatch, id_column: &str) -> Result<(RecordBatch, usize)> {
    let ids = string_column(batch, column_index(batch, id_column, STAGE)?)?;

    let mut seen: HashSet<Option<&str>> = HashSet::with_capacity(ids.len());
    let keep: Vec<u32> = ids
        .iter()
        .enumerate()
        .filter(|(_, id)| seen.insert(id.filter(|s| !is_null_token(s))))
        .map(|(row, _)| row as u32)
        .collect();

    let dropped = batch.num_rows() - keep.len();
    if dropped == 0 {
        return Ok((batch.clone(), 0));
    }
    debug!(dropped, "dropped duplicate respondents");
    Ok((take_rows(batch, &keep)?, dropped))
}
