// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Everything the pipeline needs to know about its inputs, laid out the way
/// the YAML config file is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub paths: Paths,
    pub columns: ColumnConfig,
    #[serde(default)]
    pub lookup: LookupColumns,
    #[serde(default)]
    pub sentinels: Sentinels,
    #[serde(default)]
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paths {
    pub survey: PathBuf,
    pub postcode_lookup: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// Logical role → column label in the survey export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnConfig {
    #[serde(default = "default_respondent_id")]
    pub respondent_id: String,
    /// "Did you vote in the general election?"
    pub voted: String,
    /// Follow-up that only makes sense when `voted` is affirmative.
    pub vote_followup: String,
    pub birth_year: String,
    pub postcode: String,
    pub referendum_vote: String,
    pub general_election_vote: String,
    pub party_choice: String,
    pub vote_choice: String,
    #[serde(default = "default_start_time")]
    pub start_time: String,
    #[serde(default = "default_end_time")]
    pub end_time: String,
}

/// Column names inside the postcode lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupColumns {
    #[serde(default = "default_lookup_postcode")]
    pub postcode: String,
    /// `None` takes the last column of the lookup table.
    #[serde(default)]
    pub constituency: Option<String>,
}

impl Default for LookupColumns {
    fn default() -> Self {
        Self {
            postcode: default_lookup_postcode(),
            constituency: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Sentinels {
    pub did_not_vote: String,
    pub voted: String,
    pub followup_placeholder: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            did_not_vote: "No, I do not vote".into(),
            voted: "Yes".into(),
            followup_placeholder: "I didn't vote".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// More missing cells than this in a row flags the respondent.
    pub max_missing: usize,
    pub min_duration_minutes: i64,
    pub young_age: i64,
    pub referendum_age: i64,
    pub general_election_age: i64,
    pub party_choice_age: i64,
    pub vote_choice_age: i64,
    /// Year ages are computed against; `None` means the current year.
    pub reference_year: Option<i32>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_missing: 10,
            min_duration_minutes: 5,
            young_age: 5,
            referendum_age: 22,
            general_election_age: 19,
            party_choice_age: 19,
            vote_choice_age: 21,
            reference_year: None,
        }
    }
}

fn default_respondent_id() -> String {
    "respondent_id".into()
}
fn default_start_time() -> String {
    "start_time".into()
}
fn default_end_time() -> String {
    "end_time".into()
}
fn default_lookup_postcode() -> String {
    "postcode".into()
}

impl PipelineConfig {
    pub fn from_yaml_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {:?}", path))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// The year ages are measured against: pinned in config, else today.
    pub fn reference_year(&self) -> i32 {
        use chrono::Datelike;
        self.thresholds
            .reference_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
paths:
  survey: raw_survey.csv
  postcode_lookup: postcode_lookup.csv
columns:
  voted: "Q8.0 Did you vote in the 2019 General Election?"
  vote_followup: "Q8.1 If so, how did you vote in the 2019 General Election?"
  birth_year: "Q21 What is your year of birth?"
  postcode: "Q5 What is your postcode?"
  referendum_vote: "Q6 How did you vote in the 2016 EU referendum?"
  general_election_vote: "Q7 How did you vote in the 2017 General Election?"
  party_choice: "Q9 Which party would you vote for tomorrow?"
  vote_choice: "Q10 Who did you vote for?"
"#;

    #[test]
    fn minimal_config_gets_defaults() -> Result<()> {
        let cfg = PipelineConfig::from_yaml_str(MINIMAL)?;
        assert_eq!(cfg.columns.respondent_id, "respondent_id");
        assert_eq!(cfg.columns.start_time, "start_time");
        assert_eq!(cfg.lookup.postcode, "postcode");
        assert_eq!(cfg.lookup.constituency, None);
        assert_eq!(cfg.sentinels, Sentinels::default());
        assert_eq!(cfg.thresholds.max_missing, 10);
        assert_eq!(cfg.thresholds.min_duration_minutes, 5);
        assert_eq!(cfg.paths.output, None);
        Ok(())
    }

    #[test]
    fn partial_thresholds_keep_other_defaults() -> Result<()> {
        let text = format!("{MINIMAL}thresholds:\n  max_missing: 20\n  reference_year: 2020\n");
        let cfg = PipelineConfig::from_yaml_str(&text)?;
        assert_eq!(cfg.thresholds.max_missing, 20);
        assert_eq!(cfg.thresholds.referendum_age, 22);
        assert_eq!(cfg.reference_year(), 2020);
        Ok(())
    }

    #[test]
    fn shipped_config_parses() -> Result<()> {
        let cfg = PipelineConfig::from_yaml_path(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/survey.yaml"
        ))?;
        assert_eq!(cfg.columns.birth_year, "Q21 What is your year of birth?");
        assert_eq!(cfg.thresholds, Thresholds::default());
        Ok(())
    }

    #[test]
    fn missing_question_column_is_rejected() {
        let text = MINIMAL.replace("  vote_choice: \"Q10 Who did you vote for?\"\n", "");
        assert!(PipelineConfig::from_yaml_str(&text).is_err());
    }
}
