// src/export.rs
use anyhow::{Context, Result};
use arrow::{array::Array, record_batch::RecordBatch, util::display::array_value_to_string};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::info;

/// Write `batch` to `path`: Parquet for a `.parquet` extension, CSV otherwise.
/// The file is written next to its destination and renamed into place.
#[tracing::instrument(level = "info", skip(batch, path), fields(path = %path.as_ref().display()))]
pub fn write_table<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let tmp_path = tmp_path_for(path);

    let is_parquet = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(batch, &tmp_path)?;
    } else {
        write_csv(batch, &tmp_path)?;
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {:?} → {:?}", tmp_path, path))?;
    info!(rows = batch.num_rows(), "wrote {}", path.display());
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating CSV {:?}", path))?;
    let schema = batch.schema();
    wtr.write_record(schema.fields().iter().map(|f| f.name().as_str()))?;

    let mut record: Vec<String> = Vec::with_capacity(batch.num_columns());
    for row in 0..batch.num_rows() {
        record.clear();
        for col in batch.columns() {
            if col.is_null(row) {
                record.push(String::new());
            } else {
                record.push(array_value_to_string(col.as_ref(), row)?);
            }
        }
        wtr.write_record(&record)?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating Parquet {:?}", path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(batch).context("writing survey batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::RawTable;
    use arrow::{
        array::{ArrayRef, Int64Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sample() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("respondent_id", DataType::Utf8, true),
            Field::new("Respondent age", DataType::Int64, true),
            Field::new("is_bad_respondent", DataType::Utf8, true),
        ]);
        let cols: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![Some("1"), Some("2, the second")])),
            Arc::new(Int64Array::from(vec![Some(44), None])),
            Arc::new(StringArray::from(vec![None, Some("yes")])),
        ];
        RecordBatch::try_new(Arc::new(schema), cols).unwrap()
    }

    #[test]
    fn test_csv_roundtrips_through_loader() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out/clean_survey.csv");
        write_table(&sample(), &path)?;

        assert!(!tmp_path_for(&path).exists());
        let raw = RawTable::from_csv_path(&path)?;
        assert_eq!(
            raw.headers,
            vec!["respondent_id", "Respondent age", "is_bad_respondent"]
        );
        assert_eq!(raw.rows[0], vec!["1", "44", ""]);
        assert_eq!(raw.rows[1], vec!["2, the second", "", "yes"]);
        Ok(())
    }

    #[test]
    fn test_parquet_keeps_types_and_nulls() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("clean_survey.parquet");
        let batch = sample();
        write_table(&batch, &path)?;

        let mut reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let read = reader.next().transpose()?.expect("one batch");
        assert_eq!(read.num_rows(), 2);
        assert_eq!(read.schema().field(1).data_type(), &DataType::Int64);
        assert!(read.column(2).is_null(0));
        Ok(())
    }
}
