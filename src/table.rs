// src/table.rs
//! Small helpers for rebuilding a `RecordBatch` one column at a time.
use crate::error::{FatalPipelineError, Result};
use arrow::{
    array::{Array, ArrayRef, StringArray, UInt32Array},
    compute::take,
    datatypes::{Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use std::sync::Arc;

/// Position of `name` in the batch, or a fatal error naming the stage that needed it.
pub fn column_index(batch: &RecordBatch, name: &str, stage: &'static str) -> Result<usize> {
    batch
        .schema()
        .index_of(name)
        .map_err(|_| FatalPipelineError::MissingColumn {
            stage,
            column: name.to_string(),
        })
}

pub fn has_column(batch: &RecordBatch, name: &str) -> bool {
    batch.schema().index_of(name).is_ok()
}

/// Borrow column `idx` as UTF-8 text.
pub fn string_column(batch: &RecordBatch, idx: usize) -> Result<&StringArray> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| FatalPipelineError::UnexpectedType {
            column: batch.schema().field(idx).name().clone(),
            expected: "a text column",
        })
}

/// Swap column `idx` for `array`, optionally renaming it. The field type follows the array.
pub fn replace_column(
    batch: &RecordBatch,
    idx: usize,
    new_name: Option<&str>,
    array: ArrayRef,
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len());
    let mut cols: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());

    for (i, field) in schema.fields().iter().enumerate() {
        if i == idx {
            let name = new_name.unwrap_or(field.name());
            fields.push(Field::new(name, array.data_type().clone(), true));
            cols.push(array.clone());
        } else {
            fields.push(field.as_ref().clone());
            cols.push(batch.column(i).clone());
        }
    }

    assemble(fields, cols, batch.num_rows())
}

/// Build a batch from parts; works for zero columns too.
pub fn assemble(fields: Vec<Field>, cols: Vec<ArrayRef>, num_rows: usize) -> Result<RecordBatch> {
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), cols, &options)
        .map_err(Into::into)
}

/// Keep only the rows at `indices`, in that order.
pub fn take_rows(batch: &RecordBatch, indices: &[u32]) -> Result<RecordBatch> {
    let indices = UInt32Array::from(indices.to_vec());
    let cols = batch
        .columns()
        .iter()
        .map(|col| take(col.as_ref(), &indices, None))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    assemble(fields, cols, indices.len())
}

/// Number of null cells in row `row`.
pub fn row_null_count(batch: &RecordBatch, row: usize) -> usize {
    batch
        .columns()
        .iter()
        .filter(|col| col.is_null(row))
        .count()
}
