use crate::tally::*;

use election_core::{RankedRules, TieBreakMode, ValidityPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
    pub method: VotingMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VotingMethod {
    Plurality,
    InstantRunoff,
}

/// A file of ballots. Indices are 1-based, as in spreadsheets.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
}

impl FileSource {
    /// A CSV file with one ballot per line and no other column.
    pub fn from_path(path: &str) -> FileSource {
        FileSource {
            provider: "csv".to_string(),
            file_path: path.to_string(),
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            id_column_index: None,
            count_column_index: None,
        }
    }

    /// 0-based index of the first choice column.
    pub fn first_vote_column_index(&self) -> CliResult<usize> {
        match self._first_vote_column_index {
            Some(_) => Ok(read_js_int(&self._first_vote_column_index)? - 1),
            None => Ok(0),
        }
    }

    /// 1-based index of the first line holding a ballot.
    pub fn first_vote_row_index(&self) -> CliResult<usize> {
        match self._first_vote_row_index {
            Some(_) => read_js_int(&self._first_vote_row_index),
            None => Ok(1),
        }
    }

    pub fn id_column_index_int(&self) -> CliResult<Option<usize>> {
        if self.id_column_index.is_some() {
            read_js_int(&self.id_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }

    pub fn count_column_index_int(&self) -> CliResult<Option<usize>> {
        if self.count_column_index.is_some() {
            read_js_int(&self.count_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCandidate {
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ElectionRules {
    /// Any of `full`, `optional` and `strict`. Defaults to `full`.
    pub validity: Option<Vec<String>>,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub method: VotingMethod,
    pub candidates: Vec<ConfigCandidate>,
    #[serde(default)]
    pub rules: ElectionRules,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<FileSource>,
}

pub fn read_config(path: &str) -> CliResult<TallyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: TallyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> CliResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn validate_rules(rules: &ElectionRules) -> CliResult<RankedRules> {
    let validity = match &rules.validity {
        None => ValidityPolicy::FULL,
        Some(flags) => {
            let mut policy = ValidityPolicy {
                full: false,
                optional: false,
                strict: false,
            };
            for flag in flags {
                policy = policy
                    | match flag.as_str() {
                        "full" => ValidityPolicy::FULL,
                        "optional" => ValidityPolicy::OPTIONAL,
                        "strict" => ValidityPolicy::STRICT,
                        x => whatever!("Unknown validity option {:?}", x),
                    };
            }
            policy
        }
    };
    let tiebreak_mode = match rules.tiebreak_mode.as_deref() {
        None | Some("useCandidateOrder") => TieBreakMode::UseCandidateOrder,
        Some("random") => {
            let seed = match rules.random_seed.clone().map(|s| s.parse::<u32>()) {
                Some(Ok(x)) => x,
                x => {
                    whatever!("Cannot use tiebreak mode random with seed {:?}", x)
                }
            };
            TieBreakMode::Random(seed)
        }
        Some(x) => {
            whatever!("Cannot use tiebreak mode {:?} (currently not implemented)", x)
        }
    };
    Ok(RankedRules {
        validity,
        tiebreak_mode,
    })
}

fn read_js_int(x: &Option<JSValue>) -> CliResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        // Spreadsheet-style columns: A is 1, B is 2, and so on.
        Some(JSValue::String(s)) if s.len() == 1 && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            s.to_ascii_lowercase()
                .chars()
                .next()
                .map(|c| (c as usize) - ('a' as usize) + 1)
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok(),
        _ => None,
    };
    // All the indices are 1-based.
    res.filter(|x| *x >= 1).context(ParsingJsonNumberSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rules_default_to_full_validity() {
        let rules = validate_rules(&ElectionRules::default()).unwrap();
        assert_eq!(rules, RankedRules::DEFAULT_RULES);
    }

    #[test]
    fn validity_flags_combine() {
        let rules = validate_rules(&ElectionRules {
            validity: Some(vec!["optional".to_string(), "strict".to_string()]),
            tiebreak_mode: Some("random".to_string()),
            random_seed: Some("7".to_string()),
        })
        .unwrap();
        assert_eq!(
            rules.validity,
            ValidityPolicy::OPTIONAL | ValidityPolicy::STRICT
        );
        assert_eq!(rules.tiebreak_mode, TieBreakMode::Random(7));
    }

    #[test]
    fn unknown_rules_are_errors() {
        let bad_flag = ElectionRules {
            validity: Some(vec!["lenient".to_string()]),
            ..ElectionRules::default()
        };
        assert!(validate_rules(&bad_flag).is_err());
        let missing_seed = ElectionRules {
            tiebreak_mode: Some("random".to_string()),
            ..ElectionRules::default()
        };
        assert!(validate_rules(&missing_seed).is_err());
    }

    #[test]
    fn indices() {
        assert_eq!(read_js_int(&Some(json!(3))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("2"))).unwrap(), 2);
        assert_eq!(read_js_int(&Some(json!("C"))).unwrap(), 3);
        assert!(read_js_int(&Some(json!(0))).is_err());
        assert!(read_js_int(&None).is_err());

        let source = FileSource::from_path("ballots.csv");
        assert_eq!(source.first_vote_column_index().unwrap(), 0);
        assert_eq!(source.first_vote_row_index().unwrap(), 1);
        assert_eq!(source.count_column_index_int().unwrap(), None);
    }

    #[test]
    fn parse_config() {
        let config: TallyConfig = serde_json::from_value(json!({
            "outputSettings": {"contestName": "test"},
            "method": "instantRunoff",
            "candidates": [{"name": "A"}, {"name": "B"}],
            "ballotSources": [{"provider": "csv", "filePath": "b.csv", "countColumnIndex": 2}]
        }))
        .unwrap();
        assert_eq!(config.method, VotingMethod::InstantRunoff);
        assert_eq!(config.rules, ElectionRules::default());
        assert_eq!(
            config.ballot_sources[0].count_column_index_int().unwrap(),
            Some(1)
        );
    }
}
