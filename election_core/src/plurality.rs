use log::{debug, info};
use snafu::ensure;
use std::sync::Arc;

use crate::ballot::Ballot;
use crate::ballot_log::BallotLog;
use crate::candidates::{CandidateId, CandidateSet};
use crate::config::*;

/// A first-past-the-post election.
///
/// Every ballot names exactly one candidate, and the candidates with the most ballots win.
/// Ties are possible when several candidates share the highest count.
///
/// The election is an immutable value: casting a ballot returns a new election, and the
/// election it was cast on stays valid and unchanged.
///
/// ```
/// use election_core::{Ballot, CandidateSet, PluralityElection};
///
/// let election = PluralityElection::new(CandidateSet::new(["Alice", "Bob"]))?;
/// let after = election
///     .cast(&Ballot::single("Alice"))
///     .cast(&Ballot::single("Bob"))
///     .cast(&Ballot::single("Alice"));
///
/// assert_eq!(after.winner(), vec!["Alice".to_string()]);
/// // Nothing was cast on the original election: everyone ties at zero.
/// assert_eq!(election.winner().len(), 2);
/// # Ok::<(), election_core::ElectionError>(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PluralityElection {
    candidates: Arc<CandidateSet>,
    ballots: BallotLog<CandidateId>,
}

impl PluralityElection {
    pub fn new(candidates: CandidateSet) -> Result<PluralityElection, ElectionError> {
        ensure!(!candidates.is_empty(), InvalidInputSnafu);
        debug!("PluralityElection::new: candidates: {:?}", candidates.names());
        Ok(PluralityElection {
            candidates: Arc::new(candidates),
            ballots: BallotLog::new(),
        })
    }

    /// Adds a ballot to the election.
    ///
    /// If the ballot is valid, this returns a new election containing it. Otherwise the
    /// returned election is this one, unchanged (see `same_state`).
    pub fn cast(&self, ballot: &Ballot) -> PluralityElection {
        self.try_cast(ballot).unwrap_or_else(|| self.clone())
    }

    /// Like `cast`, but returns `None` if the ballot was rejected.
    pub fn try_cast(&self, ballot: &Ballot) -> Option<PluralityElection> {
        let cid = match ballot.choices() {
            [name] => match self.candidates.id_of(name) {
                Some(cid) => cid,
                None => {
                    debug!("try_cast: rejected ballot for unknown candidate {:?}", name);
                    return None;
                }
            },
            choices => {
                debug!(
                    "try_cast: rejected ballot with {} choices: {:?}",
                    choices.len(),
                    choices
                );
                return None;
            }
        };
        Some(PluralityElection {
            candidates: self.candidates.clone(),
            ballots: self.ballots.push(cid),
        })
    }

    /// The number of ballots of every candidate, including the ones without any ballot.
    pub fn tally(&self) -> TallyResult {
        let mut counts: Vec<u64> = vec![0; self.candidates.len()];
        for cid in self.ballots.to_vec() {
            counts[cid.index()] += 1;
        }
        self.candidates
            .names()
            .iter()
            .cloned()
            .zip(counts)
            .collect()
    }

    /// Determines the winners of the election, in candidate order.
    ///
    /// Without any ballot, all the candidates are tied at zero and all of them are returned.
    pub fn winner(&self) -> Vec<String> {
        let tally = self.tally();
        let max_count: u64 = tally.iter().map(|(_, count)| *count).max().unwrap_or(0);
        let winners: Vec<String> = tally
            .into_iter()
            .filter_map(|(name, count)| if count == max_count { Some(name) } else { None })
            .collect();
        info!(
            "winner: {:?} with {} ballots out of {}",
            winners,
            max_count,
            self.ballots.len()
        );
        winners
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// The accepted ballots, in the order they were cast.
    pub fn ballots(&self) -> Vec<Ballot> {
        self.ballots
            .to_vec()
            .into_iter()
            .map(|cid| Ballot::single(self.candidates.name_of(*cid)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    /// True if both elections share the same storage, which is what a rejected `cast`
    /// returns. Equal elections built separately are not the same state.
    pub fn same_state(&self, other: &PluralityElection) -> bool {
        Arc::ptr_eq(&self.candidates, &other.candidates) && self.ballots.ptr_eq(&other.ballots)
    }
}
