use log::{debug, info, warn};

use election_core::*;
use snafu::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::tally::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive index in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("No ballot source: set ballotSources in the configuration or pass --input"))]
    NoBallotSource {},

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Line {lineno}: could not read the ballot count {content:?}"))]
    CsvCount { lineno: usize, content: String },

    #[snafu(display("The election cannot be set up"))]
    InvalidElection { source: ElectionError },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CliResult<T> = Result<T, CliError>;

/// A ballot, as parsed by the readers
/// This is before checking the choices against the candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub count: Option<u64>,
    pub choices: Vec<String>,
}

// One election of either kind, driven by the configuration.
enum Election {
    Plurality(PluralityElection),
    Ranked(RankedElection),
}

impl Election {
    fn new(config: &TallyConfig, candidates: CandidateSet) -> CliResult<Election> {
        let res = match config.method {
            VotingMethod::Plurality => {
                Election::Plurality(PluralityElection::new(candidates).context(InvalidElectionSnafu)?)
            }
            VotingMethod::InstantRunoff => {
                let rules = validate_rules(&config.rules)?;
                let election =
                    RankedElection::with_rules(candidates, rules).context(InvalidElectionSnafu)?;
                info!(
                    "ranked election: validity {:?}, tiebreak {:?}",
                    election.policy(),
                    election.rules().tiebreak_mode
                );
                Election::Ranked(election)
            }
        };
        Ok(res)
    }

    fn try_cast(&self, ballot: &Ballot) -> Option<Election> {
        match self {
            Election::Plurality(e) => e.try_cast(ballot).map(Election::Plurality),
            Election::Ranked(e) => e.try_cast(ballot).map(Election::Ranked),
        }
    }

    fn cast(&self, ballot: &Ballot) -> Election {
        match self {
            Election::Plurality(e) => Election::Plurality(e.cast(ballot)),
            Election::Ranked(e) => Election::Ranked(e.cast(ballot)),
        }
    }
}

// Counts of the ballots read from the input.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
struct BallotCounts {
    accepted: u64,
    rejected: u64,
}

fn result_stats_to_json(round_stats: &[RoundStats]) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in round_stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        if let Some(elim_stats) = &round_stat.tally_result_eliminated {
            let mut transfers: JSMap<String, JSValue> = JSMap::new();
            for (name, count) in elim_stats.transfers.iter() {
                transfers.insert(name.clone(), json!(count.to_string()));
            }
            if elim_stats.exhausted > 0 {
                transfers.insert(
                    "exhausted".to_string(),
                    json!(elim_stats.exhausted.to_string()),
                );
            }
            tally_results.push(json!({
                "eliminated": elim_stats.name,
                "transfers": transfers
            }));
        }
        for winner_name in round_stat.tally_results_elected.iter() {
            tally_results.push(json!({
                "elected": winner_name,
                "transfers": {}
            }));
        }

        let js = json!({"round": round_stat.round, "tally": tally, "tallyResults": tally_results});
        l.push(js);
    }
    l
}

fn resolution_name(resolution: Resolution) -> &'static str {
    match resolution {
        Resolution::Majority => "majority",
        Resolution::FinalTwoTie => "finalTwoTie",
        Resolution::Exhausted => "exhausted",
    }
}

fn build_summary_js(config: &TallyConfig, election: &Election, counts: BallotCounts) -> JSValue {
    // A plurality count is a single round without eliminations.
    let (winners, resolution, threshold, round_stats) = match election {
        Election::Plurality(e) => {
            let winners = e.winner();
            let resolution = if winners.len() == 1 { "mostVotes" } else { "tie" };
            let round = RoundStats {
                round: 1,
                tally: e.tally(),
                tally_results_elected: winners.clone(),
                tally_result_eliminated: None,
            };
            (winners, resolution, None, vec![round])
        }
        Election::Ranked(e) => {
            let outcome = e.tabulate();
            (
                outcome.winners,
                resolution_name(outcome.resolution),
                Some(outcome.threshold.to_string()),
                outcome.round_stats,
            )
        }
    };
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        method: config.method,
        threshold,
    };
    json!({
        "config": c,
        "ballots": {"accepted": counts.accepted, "rejected": counts.rejected},
        "winners": winners,
        "resolution": resolution,
        "results": result_stats_to_json(&round_stats)
    })
}

fn read_ranking_data(root_path: &Path, cfs: &FileSource) -> CliResult<Vec<ParsedBallot>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_ranking(&p2, cfs),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn read_candidates(config: &TallyConfig) -> CandidateSet {
    let candidates = CandidateSet::new(config.candidates.iter().map(|c| c.name.clone()));
    if candidates.len() != config.candidates.len() {
        warn!(
            "read_candidates: {} duplicate candidate names were ignored",
            config.candidates.len() - candidates.len()
        );
    }
    candidates
}

fn cast_ballots(mut election: Election, ballots: &[ParsedBallot]) -> (Election, BallotCounts) {
    let mut counts = BallotCounts::default();
    for pb in ballots.iter() {
        // Default of 1 if not specified
        let count = pb.count.unwrap_or(1);
        if count == 0 {
            continue;
        }
        let ballot = Ballot::new(pb.choices.iter().cloned());
        // Whether a ballot is accepted only depends on its content.
        match election.try_cast(&ballot) {
            Some(mut e) => {
                for _ in 1..count {
                    e = e.cast(&ballot);
                }
                election = e;
                counts.accepted += count;
            }
            None => {
                debug!("cast_ballots: ballot {:?} rejected: {:?}", pb.id, pb.choices);
                counts.rejected += count;
            }
        }
    }
    (election, counts)
}

/// Reads the election description and the ballots, and returns the JSON summary.
///
/// `input` replaces the ballot sources of the configuration with a single CSV file
/// containing one ballot per line.
pub fn tabulate_election(config_path: &str, input: Option<String>) -> CliResult<JSValue> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);

    let sources: Vec<(PathBuf, FileSource)> = match input {
        Some(path) => vec![(PathBuf::new(), FileSource::from_path(&path))],
        None => {
            let root_p = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu { path: config_path })?;
            config
                .ballot_sources
                .iter()
                .map(|cfs| (root_p.to_path_buf(), cfs.clone()))
                .collect()
        }
    };
    ensure!(!sources.is_empty(), NoBallotSourceSnafu);

    let mut data: Vec<ParsedBallot> = Vec::new();
    for (root_p, cfs) in sources.iter() {
        let mut file_data = read_ranking_data(root_p, cfs)?;
        data.append(&mut file_data);
    }
    info!("Read {} ballot lines", data.len());

    let election = Election::new(&config, read_candidates(&config))?;
    let (election, counts) = cast_ballots(election, &data);
    info!(
        "Ballots: {} accepted, {} rejected",
        counts.accepted, counts.rejected
    );
    if counts.rejected > 0 {
        warn!("{} ballots were rejected", counts.rejected);
    }

    Ok(build_summary_js(&config, &election, counts))
}

pub fn run_election(
    config_path: &str,
    input: Option<String>,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> CliResult<()> {
    let result_js = tabulate_election(config_path, input)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(path) => {
            fs::write(path, &pretty_js_stats).context(WritingSummarySnafu { path })?;
            info!("Summary written to {}", path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        if summary_ref != result_js {
            let pretty_js_summary_ref =
                serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_wrapper(test_name: &str) {
        let _ = env_logger::builder().is_test(true).try_init();
        let test_dir = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name);
        info!("Running test {}", test_name);
        let res = run_election(
            &format!("{}/{}_config.json", test_dir, test_name),
            None,
            None,
            Some(format!("{}/{}_expected_summary.json", test_dir, test_name)),
        );
        if let Err(e) = res {
            panic!("{}: an error occured: {} ({:?})", test_name, e, e);
        }
    }

    #[test]
    fn bob_sue_bill() {
        test_wrapper("bob_sue_bill");
    }

    #[test]
    fn singapore_fptp() {
        test_wrapper("singapore_fptp");
    }

    #[test]
    fn tennessee_capital() {
        test_wrapper("tennessee_capital");
    }

    #[test]
    fn optional_strict() {
        test_wrapper("optional_strict");
    }

    #[test]
    fn input_overrides_sources() {
        let test_dir = format!("{}/tests/data/bob_sue_bill", env!("CARGO_MANIFEST_DIR"));
        let js = tabulate_election(
            &format!("{}/bob_sue_bill_config.json", test_dir),
            Some(format!("{}/bob_sue_bill_ballots.csv", test_dir)),
        )
        .unwrap();
        assert_eq!(js["winners"], json!(["Sue"]));
        assert_eq!(js["ballots"]["rejected"], json!(1));
    }

    #[test]
    fn missing_config() {
        let res = tabulate_election("/nonexistent/config.json", None);
        assert!(matches!(res, Err(CliError::OpeningJson { .. })));
    }

    #[test]
    fn plurality_tie_summary() {
        let config: TallyConfig = serde_json::from_value(json!({
            "outputSettings": {"contestName": "tie"},
            "method": "plurality",
            "candidates": [{"name": "Alice"}, {"name": "Bob"}]
        }))
        .unwrap();
        let ballots = vec![
            ParsedBallot {
                id: None,
                count: Some(2),
                choices: vec!["Alice".to_string()],
            },
            ParsedBallot {
                id: None,
                count: None,
                choices: vec!["Bob".to_string(), "Alice".to_string()],
            },
            ParsedBallot {
                id: None,
                count: Some(2),
                choices: vec!["Bob".to_string()],
            },
        ];
        let election = Election::new(&config, read_candidates(&config)).unwrap();
        let (election, counts) = cast_ballots(election, &ballots);
        assert_eq!(
            counts,
            BallotCounts {
                accepted: 4,
                rejected: 1
            }
        );
        let js = build_summary_js(&config, &election, counts);
        assert_eq!(js["winners"], json!(["Alice", "Bob"]));
        assert_eq!(js["resolution"], json!("tie"));
        assert!(js["config"].get("threshold").is_none());
    }

    #[test]
    fn empty_candidates_are_rejected() {
        let config: TallyConfig = serde_json::from_value(json!({
            "outputSettings": {"contestName": "empty"},
            "method": "instantRunoff",
            "candidates": []
        }))
        .unwrap();
        let res = Election::new(&config, read_candidates(&config));
        assert!(matches!(res, Err(CliError::InvalidElection { .. })));
    }

    #[test]
    fn summary_written_to_file() {
        let test_dir = format!("{}/tests/data/tennessee_capital", env!("CARGO_MANIFEST_DIR"));
        let out = std::env::temp_dir().join(format!("tally_summary_{}.json", std::process::id()));
        let out_s = out.display().to_string();
        run_election(
            &format!("{}/tennessee_capital_config.json", test_dir),
            None,
            Some(out_s.clone()),
            None,
        )
        .unwrap();
        let written = read_summary(&out_s).unwrap();
        let expected =
            read_summary(&format!("{}/tennessee_capital_expected_summary.json", test_dir)).unwrap();
        assert_eq!(written, expected);
        fs::remove_file(&out).unwrap();
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let test_dir = format!("{}/tests/data/bob_sue_bill", env!("CARGO_MANIFEST_DIR"));
        let reference =
            std::env::temp_dir().join(format!("tally_reference_{}.json", std::process::id()));
        fs::write(&reference, r#"{"winners": ["Bob"]}"#).unwrap();
        let res = run_election(
            &format!("{}/bob_sue_bill_config.json", test_dir),
            None,
            None,
            Some(reference.display().to_string()),
        );
        assert!(matches!(res, Err(CliError::Whatever { .. })));
        fs::remove_file(&reference).unwrap();
    }
}
