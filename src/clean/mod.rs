// src/clean/mod.rs
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::load::PostcodeMap;
use crate::table::has_column;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use tracing::{debug, info};

pub mod age;
pub mod constituency;
pub mod dedup;
pub mod followup;
pub mod nulls;
pub mod prune;

/// Name the derived age column takes once the birth-year column is converted.
pub const AGE_COLUMN: &str = "Respondent age";
/// Name the postcode column takes once it holds constituencies.
pub const CONSTITUENCY_COLUMN: &str = "Respondent constituency";
/// Columns with fewer non-missing values than this are dropped.
pub const MIN_NON_MISSING: usize = 10;

/// The slice of the pipeline config the cleaner reads.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub respondent_id: String,
    pub voted: String,
    pub vote_followup: String,
    pub birth_year: String,
    pub postcode: String,
    pub did_not_vote: String,
    pub followup_placeholder: String,
    pub reference_year: i32,
}

impl CleanOptions {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            respondent_id: cfg.columns.respondent_id.clone(),
            voted: cfg.columns.voted.clone(),
            vote_followup: cfg.columns.vote_followup.clone(),
            birth_year: cfg.columns.birth_year.clone(),
            postcode: cfg.columns.postcode.clone(),
            did_not_vote: cfg.sentinels.did_not_vote.clone(),
            followup_placeholder: cfg.sentinels.followup_placeholder.clone(),
            reference_year: cfg.reference_year(),
        }
    }
}

/// What the cleaner did, for logging and the run summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_in: usize,
    pub columns_out: usize,
    pub followups_collapsed: usize,
    pub unparsed_birth_years: usize,
    pub unmatched_postcodes: usize,
    pub pruned_columns: Vec<String>,
    pub duplicates_dropped: usize,
    pub nulls_normalized: usize,
}

/// A table the cleaner already produced: birth year and postcode are always renamed
/// or pruned on the way through.
fn previously_cleaned(batch: &RecordBatch, opts: &CleanOptions) -> bool {
    !has_column(batch, &opts.birth_year) && !has_column(batch, &opts.postcode)
}

/// Run every cleaning step in order:
/// follow-up collapse → age → constituency → prune → dedup → null normalization.
///
/// Rows come out in input order with dense positions, one per respondent id.
/// On a previously cleaned table, steps whose columns were pruned are skipped.
#[tracing::instrument(level = "info", skip_all, fields(rows = batch.num_rows()))]
pub fn clean_survey(
    batch: &RecordBatch,
    postcodes: &PostcodeMap,
    opts: &CleanOptions,
) -> Result<(RecordBatch, CleanReport)> {
    let mut report = CleanReport {
        rows_in: batch.num_rows(),
        columns_in: batch.num_columns(),
        ..Default::default()
    };

    let cleaned_before = previously_cleaned(batch, opts);
    let pruned_earlier = |b: &RecordBatch, columns: &[&str]| {
        let gone = cleaned_before && columns.iter().any(|c| !has_column(b, c));
        if gone {
            debug!(?columns, "column pruned by an earlier pass, step skipped");
        }
        gone
    };

    let out = if pruned_earlier(batch, &[opts.voted.as_str(), opts.vote_followup.as_str()]) {
        batch.clone()
    } else {
        let (out, collapsed) = followup::collapse_followup(
            batch,
            &opts.voted,
            &opts.vote_followup,
            &opts.did_not_vote,
            &opts.followup_placeholder,
        )?;
        report.followups_collapsed = collapsed;
        out
    };

    let out = if pruned_earlier(&out, &[AGE_COLUMN]) {
        out
    } else {
        let (out, unparsed) = age::derive_age(&out, &opts.birth_year, opts.reference_year)?;
        report.unparsed_birth_years = unparsed;
        out
    };

    let out = if pruned_earlier(&out, &[CONSTITUENCY_COLUMN]) {
        out
    } else {
        let (out, unmatched) =
            constituency::lookup_constituency(&out, &opts.postcode, postcodes)?;
        report.unmatched_postcodes = unmatched;
        out
    };

    let (out, pruned) = prune::prune_sparse_columns(&out)?;
    report.pruned_columns = pruned;

    let (out, dropped) = dedup::dedup_respondents(&out, &opts.respondent_id)?;
    report.duplicates_dropped = dropped;

    let (out, replaced) = nulls::normalize_nulls(&out)?;
    report.nulls_normalized = replaced;

    report.rows_out = out.num_rows();
    report.columns_out = out.num_columns();
    info!(
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        columns_in = report.columns_in,
        columns_out = report.columns_out,
        pruned = report.pruned_columns.len(),
        duplicates = report.duplicates_dropped,
        "cleaned survey"
    );
    Ok((out, report))
}
