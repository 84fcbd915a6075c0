// src/clean/prune.rs
use crate::clean::{nulls::is_null_token, MIN_NON_MISSING};
use crate::error::Result;
use crate::table::assemble;
use arrow::{
    array::{Array, ArrayRef, StringArray},
    record_batch::RecordBatch,
};
use tracing::debug;

/// Values in `col` that are neither null nor a null token.
fn present_values(col: &ArrayRef) -> usize {
    match col.as_any().downcast_ref::<StringArray>() {
        Some(text) => text.iter().flatten().filter(|s| !is_null_token(s)).count(),
        None => col.len() - col.null_count(),
    }
}

/// Drop every column holding fewer than [`MIN_NON_MISSING`] non-missing values.
/// Null tokens count as missing, so the result matches what pruning sees after
/// normalization. Returns the new batch and the dropped column names, in schema order.
pub fn prune_sparse_columns(batch: &RecordBatch) -> Result<(RecordBatch, Vec<String>)> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut cols = Vec::with_capacity(batch.num_columns());
    let mut dropped = Vec::new();

    for (field, col) in schema.fields().iter().zip(batch.columns()) {
        let present = present_values(col);
        if present < MIN_NON_MISSING {
            debug!(column = %field.name(), present, "pruning sparse column");
            dropped.push(field.name().clone());
        } else {
            fields.push(field.as_ref().clone());
            cols.push(col.clone());
        }
    }

    Ok((assemble(fields, cols, batch.num_rows())?, dropped))
}
