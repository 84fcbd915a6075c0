// src/tag/conditions.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

static VOTE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvote\b").unwrap());

/// One reason a respondent is considered unreliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    ImplausibleAge,
    TooManyMissing,
    ReferendumAnswer,
    GeneralElectionAnswer,
    PartyChoiceAnswer,
    VoteChoiceAnswer,
    ContradictoryVote,
    TooFast,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::ImplausibleAge,
        Condition::TooManyMissing,
        Condition::ReferendumAnswer,
        Condition::GeneralElectionAnswer,
        Condition::PartyChoiceAnswer,
        Condition::VoteChoiceAnswer,
        Condition::ContradictoryVote,
        Condition::TooFast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::ImplausibleAge => "implausible_age",
            Condition::TooManyMissing => "too_many_missing",
            Condition::ReferendumAnswer => "referendum_answer",
            Condition::GeneralElectionAnswer => "general_election_answer",
            Condition::PartyChoiceAnswer => "party_choice_answer",
            Condition::VoteChoiceAnswer => "vote_choice_answer",
            Condition::ContradictoryVote => "contradictory_vote",
            Condition::TooFast => "too_fast",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `answer` contains "vote" as a whole word. A missing answer never does.
pub fn mentions_vote(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| VOTE_WORD.is_match(a))
}

/// Someone younger than `cutoff` whose answer doesn't talk about voting.
/// A missing age never qualifies.
pub fn young_without_vote(age: Option<i64>, cutoff: i64, answer: Option<&str>) -> bool {
    age.is_some_and(|a| a < cutoff) && !mentions_vote(answer)
}
