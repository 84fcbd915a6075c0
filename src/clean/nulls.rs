// src/clean/nulls.rs
use crate::error::Result;
use crate::table::assemble;
use arrow::{
    array::{Array, ArrayRef, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::debug;

/// Export artefacts that stand for "no answer".
pub fn is_null_token(s: &str) -> bool {
    s.eq_ignore_ascii_case("nan") || matches!(s, "np.nan" | "-9999" | "None")
}

/// Null out every null token in every text column. Returns the batch and the count replaced.
pub fn normalize_nulls(batch: &RecordBatch) -> Result<(RecordBatch, usize)> {
    let schema = batch.schema();
    let mut replaced = 0usize;
    let mut cols: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());

    for col in batch.columns() {
        let Some(sarr) = col.as_any().downcast_ref::<StringArray>() else {
            cols.push(col.clone());
            continue;
        };
        let hits = sarr.iter().flatten().filter(|s| is_null_token(s)).count();
        if hits == 0 {
            cols.push(col.clone());
            continue;
        }
        replaced += hits;
        let cleaned: StringArray = sarr
            .iter()
            .map(|opt| opt.filter(|s| !is_null_token(s)))
            .collect();
        cols.push(Arc::new(cleaned) as ArrayRef);
    }

    debug!(replaced, "normalized null tokens");
    let fields = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    Ok((assemble(fields, cols, batch.num_rows())?, replaced))
}
