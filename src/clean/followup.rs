// src/clean/followup.rs
use crate::error::Result;
use crate::table::{column_index, replace_column, string_column};
use arrow::{
    array::{Array, ArrayRef, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::debug;

const STAGE: &str = "follow-up collapse";

/// Where `voted` equals `did_not_vote`, overwrite `followup` with `placeholder`.
/// Returns the new batch and how many rows matched.
pub fn collapse_followup(
    batch: &RecordBatch,
    voted: &str,
    followup: &str,
    did_not_vote: &str,
    placeholder: &str,
) -> Result<(RecordBatch, usize)> {
    let voted_arr = string_column(batch, column_index(batch, voted, STAGE)?)?;
    let followup_idx = column_index(batch, followup, STAGE)?;
    let followup_arr = string_column(batch, followup_idx)?;

    let mut collapsed = 0usize;
    let out: StringArray = (0..batch.num_rows())
        .map(|i| {
            if voted_arr.is_valid(i) && voted_arr.value(i) == did_not_vote {
                collapsed += 1;
                Some(placeholder)
            } else if followup_arr.is_valid(i) {
                Some(followup_arr.value(i))
            } else {
                None
            }
        })
        .collect();

    debug!(collapsed, "collapsed follow-up answers");
    let batch = replace_column(batch, followup_idx, None, Arc::new(out) as ArrayRef)?;
    Ok((batch, collapsed))
}
