// src/tag/mod.rs
use crate::clean::AGE_COLUMN;
use crate::config::{PipelineConfig, Thresholds};
use crate::error::{FatalPipelineError, ParseError, Result};
use crate::table::{assemble, column_index, has_column, row_null_count, string_column};
use arrow::{
    array::{Array, ArrayRef, Int64Array, StringArray},
    datatypes::{DataType, Field},
    record_batch::RecordBatch,
};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info};

pub mod conditions;
pub mod date_parser;

pub use conditions::Condition;

pub const TAG_COLUMN: &str = "is_bad_respondent";
pub const TAG_VALUE: &str = "yes";

const STAGE: &str = "tagging";

/// Column names and cut-offs the tagger reads.
#[derive(Debug, Clone)]
pub struct TagConfig {
    pub referendum_vote: String,
    pub general_election_vote: String,
    pub party_choice: String,
    pub vote_choice: String,
    pub voted: String,
    pub vote_followup: String,
    pub start_time: String,
    pub end_time: String,
    /// "Did you vote" answer meaning yes.
    pub voted_sentinel: String,
    /// Follow-up answer meaning no.
    pub followup_negative: String,
    pub thresholds: Thresholds,
}

impl TagConfig {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            referendum_vote: cfg.columns.referendum_vote.clone(),
            general_election_vote: cfg.columns.general_election_vote.clone(),
            party_choice: cfg.columns.party_choice.clone(),
            vote_choice: cfg.columns.vote_choice.clone(),
            voted: cfg.columns.voted.clone(),
            vote_followup: cfg.columns.vote_followup.clone(),
            start_time: cfg.columns.start_time.clone(),
            end_time: cfg.columns.end_time.clone(),
            voted_sentinel: cfg.sentinels.voted.clone(),
            followup_negative: cfg.sentinels.followup_placeholder.clone(),
            thresholds: cfg.thresholds.clone(),
        }
    }
}

/// Per-condition hit counts, zero for conditions nobody tripped. A row can hit
/// several conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagReport {
    pub rows: usize,
    pub tagged: usize,
    pub hits: BTreeMap<Condition, usize>,
    pub unparsed_timestamps: usize,
}

/// Columns resolved once per run.
struct Resolved<'a> {
    age: &'a Int64Array,
    referendum: &'a StringArray,
    general_election: &'a StringArray,
    party_choice: &'a StringArray,
    vote_choice: &'a StringArray,
    voted: &'a StringArray,
    followup: &'a StringArray,
    start: &'a StringArray,
    end: &'a StringArray,
}

fn text_by_name<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    string_column(batch, column_index(batch, name, STAGE)?)
}

fn cell(arr: &StringArray, row: usize) -> Option<&str> {
    arr.is_valid(row).then(|| arr.value(row))
}

impl<'a> Resolved<'a> {
    fn new(batch: &'a RecordBatch, cfg: &TagConfig) -> Result<Self> {
        let age_idx = column_index(batch, AGE_COLUMN, STAGE)?;
        let age = batch
            .column(age_idx)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| FatalPipelineError::UnexpectedType {
                column: AGE_COLUMN.to_string(),
                expected: "an integer column",
            })?;
        Ok(Self {
            age,
            referendum: text_by_name(batch, &cfg.referendum_vote)?,
            general_election: text_by_name(batch, &cfg.general_election_vote)?,
            party_choice: text_by_name(batch, &cfg.party_choice)?,
            vote_choice: text_by_name(batch, &cfg.vote_choice)?,
            voted: text_by_name(batch, &cfg.voted)?,
            followup: text_by_name(batch, &cfg.vote_followup)?,
            start: text_by_name(batch, &cfg.start_time)?,
            end: text_by_name(batch, &cfg.end_time)?,
        })
    }

    fn timestamp(
        &self,
        arr: &StringArray,
        column: &str,
        row: usize,
    ) -> Option<Result<NaiveDateTime, ParseError>> {
        let raw = cell(arr, row)?;
        Some(
            date_parser::parse_timestamp(raw).ok_or_else(|| ParseError::Timestamp {
                row,
                column: column.to_string(),
                value: raw.to_string(),
            }),
        )
    }
}

/// Evaluate every condition for every row and write [`TAG_COLUMN`].
///
/// Rows hitting at least one condition get [`TAG_VALUE`]; the rest stay missing.
/// An existing tag column is replaced, never counted as missing.
#[tracing::instrument(level = "info", skip_all, fields(rows = batch.num_rows()))]
pub fn tag_respondents(batch: &RecordBatch, cfg: &TagConfig) -> Result<(RecordBatch, TagReport)> {
    let batch = &without_tag(batch)?;
    let cols = Resolved::new(batch, cfg)?;
    let t = &cfg.thresholds;
    let min_duration = Duration::try_minutes(t.min_duration_minutes).ok_or(
        FatalPipelineError::InvalidThreshold {
            name: "min_duration_minutes",
            value: t.min_duration_minutes,
        },
    )?;

    let mut report = TagReport {
        rows: batch.num_rows(),
        hits: Condition::ALL.iter().map(|&c| (c, 0)).collect(),
        ..Default::default()
    };
    let mut tags: Vec<Option<&str>> = Vec::with_capacity(batch.num_rows());

    for row in 0..batch.num_rows() {
        let age = cols.age.is_valid(row).then(|| cols.age.value(row));

        let start = cols.timestamp(cols.start, &cfg.start_time, row);
        let end = cols.timestamp(cols.end, &cfg.end_time, row);
        let too_fast = match (start, end) {
            (Some(Ok(s)), Some(Ok(e))) => e - s < min_duration,
            (s, e) => {
                for err in [s, e].into_iter().flatten().filter_map(|r| r.err()) {
                    debug!(%err, "duration check skipped");
                    report.unparsed_timestamps += 1;
                }
                false
            }
        };

        let hits = [
            (
                Condition::ImplausibleAge,
                age.is_some_and(|a| a < t.young_age),
            ),
            (
                Condition::TooManyMissing,
                row_null_count(batch, row) > t.max_missing,
            ),
            (
                Condition::ReferendumAnswer,
                conditions::young_without_vote(age, t.referendum_age, cell(cols.referendum, row)),
            ),
            (
                Condition::GeneralElectionAnswer,
                conditions::young_without_vote(
                    age,
                    t.general_election_age,
                    cell(cols.general_election, row),
                ),
            ),
            (
                Condition::PartyChoiceAnswer,
                conditions::young_without_vote(
                    age,
                    t.party_choice_age,
                    cell(cols.party_choice, row),
                ),
            ),
            (
                Condition::VoteChoiceAnswer,
                conditions::young_without_vote(age, t.vote_choice_age, cell(cols.vote_choice, row)),
            ),
            (
                Condition::ContradictoryVote,
                cell(cols.voted, row) == Some(cfg.voted_sentinel.as_str())
                    && cell(cols.followup, row) == Some(cfg.followup_negative.as_str()),
            ),
            (Condition::TooFast, too_fast),
        ];

        let mut bad = false;
        for (condition, hit) in hits {
            if hit {
                *report.hits.entry(condition).or_default() += 1;
                bad = true;
            }
        }
        if bad {
            report.tagged += 1;
        }
        tags.push(bad.then_some(TAG_VALUE));
    }

    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut arrays: Vec<ArrayRef> = batch.columns().to_vec();
    fields.push(Field::new(TAG_COLUMN, DataType::Utf8, true));
    arrays.push(Arc::new(StringArray::from(tags)) as ArrayRef);
    let out = assemble(fields, arrays, batch.num_rows())?;

    info!(
        rows = report.rows,
        tagged = report.tagged,
        unparsed_timestamps = report.unparsed_timestamps,
        "tagged respondents"
    );
    for (condition, n) in &report.hits {
        debug!(%condition, n, "condition hits");
    }
    Ok((out, report))
}

fn without_tag(batch: &RecordBatch) -> Result<RecordBatch> {
    if !has_column(batch, TAG_COLUMN) {
        return Ok(batch.clone());
    }
    let idx = column_index(batch, TAG_COLUMN, STAGE)?;
    let mut b = batch.clone();
    b.remove_column(idx);
    Ok(b)
}
