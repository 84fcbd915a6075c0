// src/clean/constituency.rs
use crate::clean::CONSTITUENCY_COLUMN;
use crate::error::Result;
use crate::load::PostcodeMap;
use crate::table::{column_index, has_column, replace_column, string_column};
use arrow::{
    array::{ArrayRef, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::debug;

const STAGE: &str = "constituency lookup";

/// Left-join the postcode column against `postcodes`, writing the constituency in place
/// under [`CONSTITUENCY_COLUMN`]. Unmatched postcodes become missing.
///
/// Returns the new batch and the number of present-but-unmatched postcodes.
pub fn lookup_constituency(
    batch: &RecordBatch,
    postcode: &str,
    postcodes: &PostcodeMap,
) -> Result<(RecordBatch, usize)> {
    if !has_column(batch, postcode) && has_column(batch, CONSTITUENCY_COLUMN) {
        debug!("constituency already resolved");
        return Ok((batch.clone(), 0));
    }
    let idx = column_index(batch, postcode, STAGE)?;
    let codes = string_column(batch, idx)?;

    let mut unmatched = 0usize;
    let out: StringArray = codes
        .iter()
        .map(|cell| {
            let code = cell?;
            let hit = postcodes.get(code);
            if hit.is_none() {
                unmatched += 1;
            }
            hit
        })
        .collect();

    debug!(unmatched, "resolved constituencies");
    let batch = replace_column(
        batch,
        idx,
        Some(CONSTITUENCY_COLUMN),
        Arc::new(out) as ArrayRef,
    )?;
    Ok((batch, unmatched))
}
