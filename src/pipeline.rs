// src/pipeline.rs
use crate::clean::{clean_survey, CleanOptions, CleanReport};
use crate::config::PipelineConfig;
use crate::export::write_table;
use crate::load::{load_postcode_map, load_survey, PostcodeMap};
use crate::tag::{tag_respondents, TagConfig, TagReport};
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Reports from one run, serializable for `--summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub clean: CleanReport,
    pub tag: TagReport,
    pub output: Option<PathBuf>,
}

/// Cleaned and tagged table plus what happened on the way.
#[derive(Debug)]
pub struct PipelineOutput {
    pub table: RecordBatch,
    pub summary: PipelineSummary,
}

/// Clean then tag an already-loaded survey.
pub fn run_tables(
    survey: &RecordBatch,
    postcodes: &PostcodeMap,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    let (cleaned, clean) = clean_survey(survey, postcodes, &CleanOptions::from_config(config))
        .context("cleaning survey")?;
    let (table, tag) =
        tag_respondents(&cleaned, &TagConfig::from_config(config)).context("tagging survey")?;
    Ok(PipelineOutput {
        table,
        summary: PipelineSummary {
            clean,
            tag,
            output: None,
        },
    })
}

/// Load → clean → tag → (optionally) write.
#[tracing::instrument(level = "info", skip_all, fields(survey = %config.paths.survey.display()))]
pub fn run(config: &PipelineConfig) -> Result<PipelineOutput> {
    let start = Instant::now();

    let survey = load_survey(&config.paths.survey).context("loading survey")?;
    let postcodes = load_postcode_map(&config.paths.postcode_lookup, &config.lookup)
        .context("loading postcode lookup")?;

    let mut out = run_tables(&survey, &postcodes, config)?;

    if let Some(path) = &config.paths.output {
        write_table(&out.table, path)?;
        out.summary.output = Some(path.clone());
    }

    info!(
        rows = out.table.num_rows(),
        tagged = out.summary.tag.tagged,
        elapsed = ?start.elapsed(),
        "pipeline done"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::{AGE_COLUMN, CONSTITUENCY_COLUMN};
    use crate::fixtures;
    use crate::load::RawTable;
    use crate::tag::TAG_COLUMN;
    use std::fs;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,survey_clean=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn csv_line(cells: &[Option<String>]) -> String {
        cells
            .iter()
            .map(|c| match c.as_deref() {
                Some(v) if v.contains(',') => format!("\"{}\"", v),
                Some(v) => v.to_string(),
                None => String::new(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_run_end_to_end() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;

        let mut rows = fixtures::rows(12);
        fixtures::set(&mut rows[0], fixtures::BIRTH, Some("abc"));
        fixtures::set(&mut rows[0], fixtures::POSTCODE, Some("SW1A 1"));
        fixtures::set(&mut rows[0], fixtures::VOTED, Some("No, I do not vote"));
        fixtures::set(&mut rows[0], fixtures::FOLLOWUP, Some("I will vote for X"));
        fixtures::set(&mut rows[5], fixtures::ID, Some("1"));
        fixtures::set(&mut rows[8], fixtures::END, Some("2024-05-01 10:02:00"));

        // headers contain commas too
        let header: Vec<Option<String>> = fixtures::HEADERS
            .iter()
            .map(|h| Some(h.to_string()))
            .collect();
        let mut survey = csv_line(&header);
        survey.push('\n');
        for row in &rows {
            survey.push_str(&csv_line(row));
            survey.push('\n');
        }
        let survey_path = dir.path().join("raw_survey.csv");
        fs::write(&survey_path, survey)?;

        let lookup_path = dir.path().join("postcode_lookup.csv");
        fs::write(
            &lookup_path,
            "postcode,pcon\nSW1A 1,Cities of London and Westminster\nM1 1,Manchester Central\n",
        )?;

        let mut config = fixtures::config();
        config.paths.survey = survey_path;
        config.paths.postcode_lookup = lookup_path;
        config.paths.output = Some(dir.path().join("clean_survey.csv"));

        let out = run(&config)?;
        assert_eq!(out.table.num_rows(), 11);
        assert_eq!(out.summary.clean.duplicates_dropped, 1);
        assert_eq!(out.summary.tag.tagged, 1);

        let written = RawTable::from_csv_path(config.paths.output.as_ref().unwrap())?;
        let col = |name: &str| written.headers.iter().position(|h| h == name).unwrap();
        assert_eq!(written.rows.len(), 11);
        assert_eq!(written.rows[0][col(AGE_COLUMN)], "");
        assert_eq!(
            written.rows[0][col(CONSTITUENCY_COLUMN)],
            "Cities of London and Westminster"
        );
        assert_eq!(written.rows[0][col(fixtures::FOLLOWUP)], "I didn't vote");
        assert_eq!(written.rows[1][col(AGE_COLUMN)], "44");
        // row 8 of the input is row 7 after the duplicate went
        assert_eq!(written.rows[7][col(TAG_COLUMN)], "yes");
        assert_eq!(written.rows[6][col(TAG_COLUMN)], "");
        Ok(())
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let mut config = fixtures::config();
        config.paths.survey = "no/such/survey.csv".into();
        let err = run(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("loading survey"));
    }
}
