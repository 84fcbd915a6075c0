// src/fixtures.rs
//! Survey tables for unit tests.
use crate::config::{ColumnConfig, LookupColumns, Paths, PipelineConfig, Sentinels, Thresholds};
use crate::load::PostcodeMap;
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

pub const ID: &str = "respondent_id";
pub const START: &str = "start_time";
pub const END: &str = "end_time";
pub const POSTCODE: &str = "Q5 What is your postcode?";
pub const REFERENDUM: &str = "Q6 How did you vote in the 2016 EU referendum?";
pub const GENERAL: &str = "Q7 How did you vote in the 2017 General Election?";
pub const VOTED: &str = "Q8.0 Did you vote in the 2019 General Election?";
pub const FOLLOWUP: &str = "Q8.1 If so, how did you vote in the 2019 General Election?";
pub const PARTY: &str = "Q9 Which party would you vote for tomorrow?";
pub const WHO: &str = "Q10 Who did you vote for in the local elections?";
pub const BIRTH: &str = "Q21 What is your year of birth?";
pub const RARE: &str = "Q30 Is there anything else you would like to tell us?";

pub const HEADERS: [&str; 12] = [
    ID, START, END, POSTCODE, REFERENDUM, GENERAL, VOTED, FOLLOWUP, PARTY, WHO, BIRTH, RARE,
];

pub type Row = Vec<Option<String>>;

/// An adult respondent who trips none of the checks.
pub fn row(id: &str) -> Row {
    [
        Some(id),
        Some("2024-05-01 10:00:00"),
        Some("2024-05-01 10:20:00"),
        Some("M1 1"),
        Some("Remain"),
        Some("Labour"),
        Some("Yes"),
        Some("Labour"),
        Some("Labour"),
        Some("Labour"),
        Some("1980"),
        None,
    ]
    .into_iter()
    .map(|v| v.map(str::to_string))
    .collect()
}

/// `n` well-behaved respondents with ids "1".."n".
pub fn rows(n: usize) -> Vec<Row> {
    (1..=n).map(|i| row(&i.to_string())).collect()
}

pub fn set(row: &mut Row, column: &str, value: Option<&str>) {
    let idx = HEADERS
        .iter()
        .position(|h| *h == column)
        .expect("fixture column");
    row[idx] = value.map(str::to_string);
}

pub fn batch(rows: &[Row]) -> RecordBatch {
    let fields: Vec<Field> = HEADERS
        .iter()
        .map(|h| Field::new(*h, DataType::Utf8, true))
        .collect();
    let cols: Vec<ArrayRef> = (0..HEADERS.len())
        .map(|i| {
            let arr: StringArray = rows.iter().map(|r| r[i].as_deref()).collect();
            Arc::new(arr) as ArrayRef
        })
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), cols).expect("fixture batch")
}

pub fn lookup() -> PostcodeMap {
    [
        ("SW1A 1", "Cities of London and Westminster"),
        ("M1 1", "Manchester Central"),
    ]
    .into_iter()
    .collect()
}

pub fn config() -> PipelineConfig {
    PipelineConfig {
        paths: Paths {
            survey: "raw_survey.csv".into(),
            postcode_lookup: "postcode_lookup.csv".into(),
            output: None,
        },
        columns: ColumnConfig {
            respondent_id: ID.into(),
            voted: VOTED.into(),
            vote_followup: FOLLOWUP.into(),
            birth_year: BIRTH.into(),
            postcode: POSTCODE.into(),
            referendum_vote: REFERENDUM.into(),
            general_election_vote: GENERAL.into(),
            party_choice: PARTY.into(),
            vote_choice: WHO.into(),
            start_time: START.into(),
            end_time: END.into(),
        },
        lookup: LookupColumns::default(),
        sentinels: Sentinels::default(),
        thresholds: Thresholds {
            reference_year: Some(2024),
            ..Default::default()
        },
    }
}
