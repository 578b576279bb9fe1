use log::{debug, info};
use snafu::ensure;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::ballot::Ballot;
use crate::ballot_log::BallotLog;
use crate::candidates::{CandidateId, CandidateSet};
use crate::config::*;

// Why a ballot was turned down. Only used for reporting.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Rejection {
    UnknownCandidates(usize),
    IncompleteRanking { ranked: usize, expected: usize },
    NoKnownCandidate,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::UnknownCandidates(diff) => write!(f, "{} unknown candidates", diff),
            Rejection::IncompleteRanking { ranked, expected } => {
                write!(f, "ranks {} candidates out of {}", ranked, expected)
            }
            Rejection::NoKnownCandidate => write!(f, "no known candidate"),
        }
    }
}

// The ballots held by every candidate, indexed by candidate.
// Each ballot is reduced to the preferences after the one that placed it there.
type Buckets<'a> = Vec<Vec<&'a [CandidateId]>>;

// The outcome of handing a pool of ballots to the continuing candidates.
struct Distribution {
    received: Vec<u64>,
    exhausted: u64,
}

/// An instant-runoff election.
///
/// Every ballot ranks candidates by preference. Each round, ballots count for their
/// most preferred continuing candidate. A candidate holding more than half of the
/// counted ballots wins. Otherwise the candidate with the fewest ballots is eliminated
/// and their ballots move on to the next continuing preference. When two candidates
/// are left holding ballots without a majority, both are returned.
///
/// ```
/// use election_core::{Ballot, CandidateSet, RankedElection, ValidityPolicy};
///
/// let mut election =
///     RankedElection::new(CandidateSet::new(["Bob", "Sue", "Bill"]), ValidityPolicy::FULL)?;
/// for b in [
///     ["Bob", "Bill", "Sue"],
///     ["Bob", "Bill", "Sue"],
///     ["Sue", "Bob", "Bill"],
///     ["Sue", "Bob", "Bill"],
///     ["Bill", "Sue", "Bob"],
/// ] {
///     election = election.cast(&Ballot::from(b));
/// }
/// assert_eq!(election.winner(), vec!["Sue".to_string()]);
/// # Ok::<(), election_core::ElectionError>(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedElection {
    candidates: Arc<CandidateSet>,
    rules: RankedRules,
    ballots: BallotLog<Vec<CandidateId>>,
}

impl RankedElection {
    pub fn new(
        candidates: CandidateSet,
        policy: ValidityPolicy,
    ) -> Result<RankedElection, ElectionError> {
        RankedElection::with_rules(
            candidates,
            RankedRules {
                validity: policy,
                ..RankedRules::DEFAULT_RULES
            },
        )
    }

    pub fn with_rules(
        candidates: CandidateSet,
        rules: RankedRules,
    ) -> Result<RankedElection, ElectionError> {
        ensure!(!candidates.is_empty(), InvalidInputSnafu);
        debug!(
            "RankedElection::with_rules: candidates: {:?}, rules: {:?}",
            candidates.names(),
            rules
        );
        Ok(RankedElection {
            candidates: Arc::new(candidates),
            rules,
            ballots: BallotLog::new(),
        })
    }

    pub fn rules(&self) -> &RankedRules {
        &self.rules
    }

    pub fn policy(&self) -> ValidityPolicy {
        self.rules.validity
    }

    /// Applies the validity policy. On success, returns the known candidates of the
    /// ballot, in order.
    fn check(&self, ballot: &Ballot) -> Result<Vec<CandidateId>, Rejection> {
        let known: Vec<CandidateId> = ballot
            .iter()
            .filter_map(|name| self.candidates.id_of(name))
            .collect();
        let diff = ballot.len() - known.len();
        let policy = self.rules.validity;
        if policy.contains(ValidityPolicy::STRICT) && diff != 0 {
            return Err(Rejection::UnknownCandidates(diff));
        }
        if policy.contains(ValidityPolicy::FULL) && known.len() != self.candidates.len() {
            return Err(Rejection::IncompleteRanking {
                ranked: known.len(),
                expected: self.candidates.len(),
            });
        }
        if policy.contains(ValidityPolicy::OPTIONAL) && known.is_empty() {
            return Err(Rejection::NoKnownCandidate);
        }
        Ok(known)
    }

    /// Adds a ballot to the election.
    ///
    /// If the ballot passes the validity policy, this returns a new election containing
    /// it, stripped of the names that are not candidates. Otherwise the returned election
    /// is this one, unchanged (see `same_state`).
    pub fn cast(&self, ballot: &Ballot) -> RankedElection {
        self.try_cast(ballot).unwrap_or_else(|| self.clone())
    }

    /// Like `cast`, but returns `None` if the ballot was rejected.
    pub fn try_cast(&self, ballot: &Ballot) -> Option<RankedElection> {
        match self.check(ballot) {
            Ok(ranks) => {
                if ranks.len() != ballot.len() {
                    debug!(
                        "try_cast: dropped {} unknown candidates from {:?}",
                        ballot.len() - ranks.len(),
                        ballot.choices()
                    );
                }
                Some(RankedElection {
                    candidates: self.candidates.clone(),
                    rules: self.rules,
                    ballots: self.ballots.push(ranks),
                })
            }
            Err(rejection) => {
                debug!(
                    "try_cast: rejected ballot {:?}: {}",
                    ballot.choices(),
                    rejection
                );
                None
            }
        }
    }

    /// Determines the winners of the election, in candidate order.
    pub fn winner(&self) -> Vec<String> {
        self.tabulate().winners
    }

    /// Runs the instant-runoff count and returns the winners with the statistics of
    /// every round.
    pub fn tabulate(&self) -> RankedOutcome {
        let cands: &CandidateSet = &self.candidates;
        let stored: Vec<&Vec<CandidateId>> = self.ballots.to_vec();
        info!(
            "tabulate: Processing {} ballots, candidates: {:?}",
            stored.len(),
            cands.names()
        );

        let mut continuing: Vec<bool> = vec![true; cands.len()];
        let mut buckets: Buckets = vec![Vec::new(); cands.len()];
        let initial = distribute(
            stored.into_iter().map(|b| b.as_slice()).collect(),
            &continuing,
            &mut buckets,
        );
        if initial.exhausted > 0 {
            debug!(
                "tabulate: {} ballots without any candidate",
                initial.exhausted
            );
        }

        let mut round_stats: Vec<RoundStats> = Vec::new();
        let mut round: u32 = 1;
        loop {
            let tally: Vec<(CandidateId, u64)> = cands
                .ids()
                .filter(|cid| continuing[cid.index()])
                .map(|cid| (cid, buckets[cid.index()].len() as u64))
                .collect();
            let total: u64 = tally.iter().map(|(_, count)| *count).sum();
            // Candidates without any ballot are never eliminated: they do not count
            // for the final two and cannot be the lowest.
            let holding: Vec<(CandidateId, u64)> = tally
                .iter()
                .filter(|(_, count)| *count > 0)
                .cloned()
                .collect();
            let threshold: u64 = if total == 0 { 0 } else { total / 2 + 1 };
            info!("Round {} (winning threshold: {})", round, threshold);
            for (cid, count) in tally.iter() {
                info!("{:>8} {}", count, cands.name_of(*cid));
            }
            let named_tally: TallyResult = tally
                .iter()
                .map(|(cid, count)| (cands.name_of(*cid).to_string(), *count))
                .collect();

            if let Some((cid, count)) = holding.iter().find(|(_, count)| *count >= threshold) {
                let name = cands.name_of(*cid).to_string();
                info!("{:>8} {} -> elected", count, name);
                round_stats.push(RoundStats {
                    round,
                    tally: named_tally,
                    tally_results_elected: vec![name.clone()],
                    tally_result_eliminated: None,
                });
                return RankedOutcome {
                    winners: vec![name],
                    resolution: Resolution::Majority,
                    threshold,
                    round_stats,
                };
            }

            if holding.len() == 2 {
                let names: Vec<String> = holding
                    .iter()
                    .map(|(cid, _)| cands.name_of(*cid).to_string())
                    .collect();
                info!("tabulate: no majority between the final two: {:?}", names);
                round_stats.push(RoundStats {
                    round,
                    tally: named_tally,
                    tally_results_elected: names.clone(),
                    tally_result_eliminated: None,
                });
                return RankedOutcome {
                    winners: names,
                    resolution: Resolution::FinalTwoTie,
                    threshold,
                    round_stats,
                };
            }

            let loser: CandidateId = match self.find_eliminated_candidate(&holding, round) {
                Some(cid) => cid,
                None => {
                    // Nobody holds a ballot anymore.
                    info!("tabulate: all ballots are exhausted, every candidate wins");
                    round_stats.push(RoundStats {
                        round,
                        tally: named_tally,
                        tally_results_elected: Vec::new(),
                        tally_result_eliminated: None,
                    });
                    return RankedOutcome {
                        winners: cands.names().to_vec(),
                        resolution: Resolution::Exhausted,
                        threshold,
                        round_stats,
                    };
                }
            };

            continuing[loser.index()] = false;
            let pool = std::mem::take(&mut buckets[loser.index()]);
            let pool_size = pool.len();
            let moved = distribute(pool, &continuing, &mut buckets);
            let transfers: Vec<(String, u64)> = cands
                .ids()
                .filter(|cid| moved.received[cid.index()] > 0)
                .map(|cid| {
                    (
                        cands.name_of(cid).to_string(),
                        moved.received[cid.index()],
                    )
                })
                .collect();
            let elimination = EliminationStats {
                name: cands.name_of(loser).to_string(),
                transfers,
                exhausted: moved.exhausted,
            };
            info!(
                "{:>8} {} -> eliminated: {:?}, {} exhausted",
                pool_size,
                elimination.name,
                elimination.transfers,
                elimination.exhausted
            );
            round_stats.push(RoundStats {
                round,
                tally: named_tally,
                tally_results_elected: Vec::new(),
                tally_result_eliminated: Some(elimination),
            });
            round += 1;
        }
    }

    // Picks the candidate with the fewest ballots among the ones holding ballots.
    // Returns None if no candidate holds a ballot.
    fn find_eliminated_candidate(
        &self,
        holding: &[(CandidateId, u64)],
        round: u32,
    ) -> Option<CandidateId> {
        let min_count: u64 = holding.iter().map(|(_, count)| *count).min()?;
        let all_smallest: Vec<CandidateId> = holding
            .iter()
            .filter_map(|(cid, count)| if *count == min_count { Some(*cid) } else { None })
            .collect();
        if all_smallest.len() > 1 {
            debug!(
                "find_eliminated_candidate: tie between {:?} in round {}",
                all_smallest, round
            );
        }
        // `holding` is in candidate order.
        match self.rules.tiebreak_mode {
            TieBreakMode::UseCandidateOrder => all_smallest.first().copied(),
            TieBreakMode::Random(seed) => all_smallest
                .into_iter()
                .min_by_key(|cid| tiebreak_key(seed, round, self.candidates.name_of(*cid))),
        }
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// The accepted ballots, in the order they were cast, without the unknown names.
    pub fn ballots(&self) -> Vec<Ballot> {
        self.ballots
            .to_vec()
            .into_iter()
            .map(|ranks| {
                ranks
                    .iter()
                    .map(|cid| self.candidates.name_of(*cid))
                    .collect::<Ballot>()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    /// True if both elections share the same storage, which is what a rejected `cast`
    /// returns.
    pub fn same_state(&self, other: &RankedElection) -> bool {
        Arc::ptr_eq(&self.candidates, &other.candidates)
            && self.rules == other.rules
            && self.ballots.ptr_eq(&other.ballots)
    }
}

// Hands every ballot of the pool to its first continuing preference.
fn distribute<'a>(
    pool: Vec<&'a [CandidateId]>,
    continuing: &[bool],
    buckets: &mut Buckets<'a>,
) -> Distribution {
    let mut received: Vec<u64> = vec![0; buckets.len()];
    let mut exhausted: u64 = 0;
    for ranks in pool {
        match ranks.iter().position(|cid| continuing[cid.index()]) {
            Some(idx) => {
                let cid = ranks[idx];
                buckets[cid.index()].push(&ranks[idx + 1..]);
                received[cid.index()] += 1;
            }
            None => exhausted += 1,
        }
    }
    Distribution {
        received,
        exhausted,
    }
}

/// Orders the tied candidates in a way that is hard to guess in advance but fully
/// reproducible from the seed.
fn tiebreak_key(seed: u32, round: u32, name: &str) -> String {
    let data = format!("{:08}{:08}{}", seed, round, name);
    sha256::digest(data.as_str())
}
